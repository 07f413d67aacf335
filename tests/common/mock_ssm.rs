use std::{collections::HashMap, sync::Mutex};

use anyhow::{Result, bail};

use eksrefresh::clients::SsmClients;

/// Mock SSM client serving parameters from a map. Every requested name is recorded.
#[derive(Default)]
pub struct MockSsmClients {
  pub parameters: HashMap<String, Option<String>>,
  pub requested: Mutex<Vec<String>>,
}

impl MockSsmClients {
  /// Serves `value` for any parameter name
  pub fn returning(value: &str) -> Self {
    Self {
      parameters: HashMap::from([("*".to_string(), Some(value.to_string()))]),
      ..Default::default()
    }
  }

  pub fn requested(&self) -> Vec<String> {
    self.requested.lock().unwrap().clone()
  }
}

impl SsmClients for MockSsmClients {
  async fn get_parameter(&self, name: &str) -> Result<Option<String>> {
    self.requested.lock().unwrap().push(name.to_string());

    match self.parameters.get(name).or_else(|| self.parameters.get("*")) {
      Some(value) => Ok(value.clone()),
      None => bail!("ParameterNotFound: {name}"),
    }
  }
}

/// Mock that returns errors for all methods
pub struct MockSsmClientsError;

impl SsmClients for MockSsmClientsError {
  async fn get_parameter(&self, _name: &str) -> Result<Option<String>> { bail!("mock SSM error") }
}
