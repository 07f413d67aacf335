//! Drains pods from a node, similar to `kubectl drain`.
//!
//! Draining happens client side: the node is cordoned first (see [`cordon_and_drain`]),
//! then each pod on the node is removed through the Eviction API so that
//! PodDisruptionBudgets are respected. Pods are handled one at a time.
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::{
  clients::{EvictionOutcome, K8sClients},
  config::DrainConfig,
  error::{Error, Result},
};

const MIRROR_POD_ANNOTATION: &str = "kubernetes.io/config.mirror";

/// Pods handled while draining a node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainSummary {
  /// `namespace/name` of each pod evicted (or already gone)
  pub evicted: Vec<String>,
  /// `namespace/name` of each pod left in place
  pub skipped: Vec<String>,
}

/// Evicts all pods on the given node
///
/// Skipped, as with `kubectl drain`:
/// * DaemonSet pods - the DaemonSet controller ignores cordons and would recreate them
/// * Mirror pods - static pods managed by the kubelet cannot be evicted
/// * Completed pods - nothing is running
///
/// Evictions refused by a PodDisruptionBudget are retried every
/// `eviction_retry_interval` up to `max_eviction_attempts`.
pub async fn drain_node<C: K8sClients>(client: &C, node_name: &str, config: &DrainConfig) -> Result<DrainSummary> {
  let pods = client.list_pods_on_node(node_name).await.map_err(|err| {
    error!("Unable to find pods on node {node_name}: {err}");
    Error::transport(format!("List pods on node {node_name}"), err)
  })?;

  let mut summary = DrainSummary::default();

  for pod in &pods {
    let namespace = pod.namespace().unwrap_or_else(|| "default".to_string());
    let name = pod.name_any();
    let qualified = format!("{namespace}/{name}");

    if let Some(reason) = skip_reason(pod) {
      info!("Not draining pod '{qualified}': {reason}");
      summary.skipped.push(qualified);
      continue;
    }

    if evict_pod(client, &namespace, &name, config).await? {
      wait_for_deletion(client, &namespace, &name, pod.uid().as_deref(), config).await;
    }
    summary.evicted.push(qualified);
  }

  info!(
    "Drained node {node_name}: {} evicted, {} skipped",
    summary.evicted.len(),
    summary.skipped.len()
  );

  Ok(summary)
}

/// Cordons the node and then drains it
///
/// Cordoning first keeps evicted pods from being rescheduled back onto the node.
/// A failed cordon stops before any pod is evicted.
pub async fn cordon_and_drain<C: K8sClients>(
  client: &C,
  node_name: &str,
  config: &DrainConfig,
) -> Result<DrainSummary> {
  super::cordon_node(client, node_name).await?;
  drain_node(client, node_name, config).await
}

/// Returns why a pod is left on the node, or `None` when it should be evicted
fn skip_reason(pod: &Pod) -> Option<&'static str> {
  let phase = pod.status.as_ref().and_then(|status| status.phase.as_deref());
  if matches!(phase, Some("Succeeded") | Some("Failed")) {
    return Some("pod has completed");
  }

  let daemonset_owned = pod
    .metadata
    .owner_references
    .iter()
    .flatten()
    .any(|owner| owner.controller == Some(true) && owner.kind == "DaemonSet");
  if daemonset_owned {
    return Some("pod is member of a DaemonSet");
  }

  if pod.annotations().contains_key(MIRROR_POD_ANNOTATION) {
    return Some("pod is a static mirror pod");
  }

  None
}

/// Creates an eviction for the pod, returning whether it has to be waited on
///
/// A pod that no longer exists counts as evicted without waiting. At least one
/// eviction is always attempted.
async fn evict_pod<C: K8sClients>(client: &C, namespace: &str, name: &str, config: &DrainConfig) -> Result<bool> {
  let max_attempts = config.max_eviction_attempts.max(1);

  for attempt in 1..=max_attempts {
    debug!("Attempting to evict pod {namespace}/{name} ({attempt}/{max_attempts})");

    match client.evict_pod(namespace, name).await {
      Ok(EvictionOutcome::Evicted) => {
        info!("Successfully evicted pod {namespace}/{name}");
        return Ok(true);
      }
      Ok(EvictionOutcome::NotFound) => {
        info!("Pod {namespace}/{name} is already gone");
        return Ok(false);
      }
      Ok(EvictionOutcome::Blocked(reason)) if attempt == max_attempts => {
        warn!("Eviction of pod {namespace}/{name} refused: '{reason}'. Giving up after {max_attempts} attempts");
      }
      Ok(EvictionOutcome::Blocked(reason)) => {
        warn!(
          "Eviction of pod {namespace}/{name} refused: '{reason}'. Check PodDisruptionBudgets. Retrying in {:.2}s",
          config.eviction_retry_interval().as_secs_f64()
        );
        sleep(config.eviction_retry_interval()).await;
      }
      Err(err) => {
        error!("Unable to evict pod {namespace}/{name}: {err}");
        return Err(Error::transport(format!("Evict pod {namespace}/{name}"), err));
      }
    }
  }

  Err(Error::EvictionBlocked {
    pod: format!("{namespace}/{name}"),
    attempts: max_attempts,
  })
}

/// Polls until the pod is gone or the deletion timeout elapses
///
/// A pod with the same name but a different UID is a replacement (e.g. a
/// StatefulSet pod recreated elsewhere) and counts as deleted. A timeout is
/// logged and otherwise ignored.
async fn wait_for_deletion<C: K8sClients>(
  client: &C,
  namespace: &str,
  name: &str,
  uid: Option<&str>,
  config: &DrainConfig,
) {
  let start_time = Instant::now();

  loop {
    match client.pod_exists(namespace, name, uid).await {
      Ok(false) => {
        info!("Pod {namespace}/{name} deleted");
        return;
      }
      Ok(true) => debug!("Pod {namespace}/{name} not yet deleted"),
      Err(err) => warn!("Could not determine if pod {namespace}/{name} has been deleted: {err}"),
    }

    if start_time.elapsed() >= config.deletion_timeout() {
      warn!(
        "Pod {namespace}/{name} was not deleted within {:.2}s",
        config.deletion_timeout().as_secs_f64()
      );
      return;
    }
    sleep(config.deletion_check_interval()).await;
  }
}
