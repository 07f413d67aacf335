use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tracing::{debug, error, info};

use crate::{
  clients::SsmClients,
  error::{Error, Result},
};

/// RFC 850 layout used for the capture timestamp, e.g. `Tuesday, 02-Jan-24 15:04:05 UTC`
const RFC850: &str = "%A, %d-%b-%y %H:%M:%S %Z";

/// Source of the current time embedded in release records
pub trait Clock {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// EKS optimized Amazon Linux 2 AMI family
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Architecture {
  X86_64,
  Arm64,
}

impl Architecture {
  /// Maps a node architecture name onto an AMI family
  ///
  /// Only `arm64` selects the ARM family; every other value, including
  /// unrecognized ones, falls back to x86_64
  pub fn from_name(name: &str) -> Self {
    match name {
      "arm64" => Self::Arm64,
      _ => Self::X86_64,
    }
  }

  fn ami_family(&self) -> &'static str {
    match self {
      Self::X86_64 => "amazon-linux-2",
      Self::Arm64 => "amazon-linux-2-arm64",
    }
  }
}

/// Returns the SSM parameter holding the recommended AMI release version
///
/// The Kubernetes version is embedded as given, without validation
pub fn parameter_key(eks_version: &str, architecture: &str) -> String {
  let family = Architecture::from_name(architecture).ami_family();
  format!("/aws/service/eks/optimized-ami/{eks_version}/{family}/recommended/release_version")
}

/// The recommended AMI release for a cluster version and architecture at a point in time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
#[tabled(rename_all = "UpperCase")]
pub struct ReleaseRecord {
  pub name: String,
  #[tabled(rename = "EKS VERSION")]
  pub eks_version: String,
  pub architecture: String,
  #[tabled(rename = "RELEASE")]
  pub value: String,
}

/// Look up the latest recommended EKS optimized AMI release version
///
/// Every call queries Parameter Store; failures are returned without retry
pub async fn get_release<S, C>(ssm: &S, clock: &C, eks_version: &str, architecture: &str) -> Result<ReleaseRecord>
where
  S: SsmClients,
  C: Clock,
{
  debug!("Current EKS version: {eks_version}");
  debug!("Current node architecture: {architecture}");

  let parameter_name = parameter_key(eks_version, architecture);
  debug!("Parameter: {parameter_name}");

  let value = match ssm.get_parameter(&parameter_name).await {
    Ok(Some(value)) => value,
    Ok(None) => {
      error!("Parameter {parameter_name} has no value");
      return Err(Error::transport(
        format!("Get parameter {parameter_name}"),
        anyhow::anyhow!("parameter value is missing"),
      ));
    }
    Err(err) => {
      error!("{err}");
      return Err(Error::transport(format!("Get parameter {parameter_name}"), err));
    }
  };

  info!("{value}");

  Ok(ReleaseRecord {
    name: format!("LATEST RELEASE AS OF {}", clock.now().format(RFC850)),
    eks_version: eks_version.to_owned(),
    architecture: architecture.to_owned(),
    value,
  })
}
