use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from `.eksrefresh.yaml` or an explicit path.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub drain: DrainConfig,
}

/// Tuning for draining a node of its pods
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainConfig {
  /// Seconds to wait before retrying an eviction blocked by a PodDisruptionBudget (default 5)
  #[serde(default = "default_eviction_retry_interval_secs")]
  pub eviction_retry_interval_secs: u64,

  /// Eviction attempts per pod before the drain is abandoned (default 60)
  #[serde(default = "default_max_eviction_attempts")]
  pub max_eviction_attempts: u32,

  /// Seconds between checks that an evicted pod is gone (default 5)
  #[serde(default = "default_deletion_check_interval_secs")]
  pub deletion_check_interval_secs: u64,

  /// Seconds to wait for an evicted pod to be deleted (default 300)
  #[serde(default = "default_deletion_timeout_secs")]
  pub deletion_timeout_secs: u64,
}

fn default_eviction_retry_interval_secs() -> u64 {
  5
}

fn default_max_eviction_attempts() -> u32 {
  60
}

fn default_deletion_check_interval_secs() -> u64 {
  5
}

fn default_deletion_timeout_secs() -> u64 {
  300
}

impl Default for DrainConfig {
  fn default() -> Self {
    Self {
      eviction_retry_interval_secs: default_eviction_retry_interval_secs(),
      max_eviction_attempts: default_max_eviction_attempts(),
      deletion_check_interval_secs: default_deletion_check_interval_secs(),
      deletion_timeout_secs: default_deletion_timeout_secs(),
    }
  }
}

impl DrainConfig {
  pub fn eviction_retry_interval(&self) -> Duration {
    Duration::from_secs(self.eviction_retry_interval_secs)
  }

  pub fn deletion_check_interval(&self) -> Duration {
    Duration::from_secs(self.deletion_check_interval_secs)
  }

  pub fn deletion_timeout(&self) -> Duration {
    Duration::from_secs(self.deletion_timeout_secs)
  }

  fn validate(&self) -> Result<()> {
    if self.max_eviction_attempts == 0 {
      bail!("drain.max_eviction_attempts must be at least 1");
    }
    Ok(())
  }
}

const DEFAULT_CONFIG_FILE: &str = ".eksrefresh.yaml";

/// Load configuration from an explicit path, the default `.eksrefresh.yaml` in the
/// current working directory, or fall back to `Config::default()`.
pub fn load(path: Option<&str>) -> Result<Config> {
  load_from(path, std::env::current_dir().ok().as_deref())
}

fn load_from(path: Option<&str>, base_dir: Option<&std::path::Path>) -> Result<Config> {
  if let Some(p) = path {
    return read_config(std::path::Path::new(p));
  }

  if let Some(dir) = base_dir {
    let default_path = dir.join(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
      return read_config(&default_path);
    }
  }

  Ok(Config::default())
}

fn read_config(path: &std::path::Path) -> Result<Config> {
  let contents =
    std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
  let config: Config =
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))?;
  config
    .drain
    .validate()
    .with_context(|| format!("Invalid config file: {}", path.display()))?;

  Ok(config)
}
