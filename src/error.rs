use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the node and release operations
#[derive(Debug, Error)]
pub enum Error {
  /// A call to the Kubernetes API or to SSM Parameter Store failed
  #[error("{operation} failed: {source}")]
  Transport {
    operation: String,
    #[source]
    source: anyhow::Error,
  },

  /// A client could not be configured (missing kubeconfig, credentials, etc.)
  #[error("Unable to establish client configuration: {0}")]
  Configuration(String),

  /// Attempted to dequeue from an empty node queue
  #[error("Node queue is empty")]
  EmptyQueue,

  /// A PodDisruptionBudget kept blocking the eviction of a pod
  #[error("Pod '{pod}' could not be evicted after {attempts} attempts")]
  EvictionBlocked { pod: String, attempts: u32 },
}

impl Error {
  pub(crate) fn transport(operation: impl Into<String>, source: anyhow::Error) -> Self {
    Self::Transport {
      operation: operation.into(),
      source,
    }
  }
}
