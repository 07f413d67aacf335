use std::{fs::File, io::prelude::*};

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::{Table, settings::Style};

use crate::{
  nodes::{DrainSummary, NodeQueue},
  release::ReleaseRecord,
};

#[derive(Clone, Copy, Debug, Default, ValueEnum, Serialize, Deserialize)]
pub enum Format {
  /// JSON format used for logging or writing to a *.json file
  Json,
  /// Text format used for writing to stdout
  #[default]
  Text,
}

/// Types that can be rendered as a table for stdout
pub trait Render: Serialize {
  fn to_stdout_table(&self) -> Result<String>;
}

impl Render for NodeQueue {
  fn to_stdout_table(&self) -> Result<String> {
    if self.is_empty() {
      return Ok("No nodes found".to_string());
    }

    let mut table = Table::new(self.iter().cloned());
    table.with(Style::sharp());

    Ok(table.to_string())
  }
}

impl Render for ReleaseRecord {
  fn to_stdout_table(&self) -> Result<String> {
    let mut table = Table::new([self.clone()]);
    table.with(Style::sharp());

    Ok(table.to_string())
  }
}

impl Render for DrainSummary {
  fn to_stdout_table(&self) -> Result<String> {
    let mut output = String::new();

    for (label, pods) in [("Evicted", &self.evicted), ("Skipped", &self.skipped)] {
      output.push_str(&format!("{label} ({}):\n", pods.len()));
      for pod in pods {
        output.push_str(&format!("  {pod}\n"));
      }
    }

    Ok(output)
  }
}

/// Renders the value in the format requested
pub fn render<T: Render>(value: &T, format: &Format) -> Result<String> {
  let output = match format {
    Format::Json => serde_json::to_string_pretty(value)?,
    Format::Text => value.to_stdout_table()?,
  };

  Ok(output)
}

/// Writes the rendered value to the file provided, or stdout when none is given
pub fn output<T: Render>(value: &T, format: &Format, filename: &Option<String>) -> Result<()> {
  let output = render(value, format)?;

  match filename {
    Some(filename) => {
      let mut file = File::create(filename)?;
      file.write_all(output.as_bytes())?;
    }
    None => {
      println!("{output}");
    }
  }

  Ok(())
}
