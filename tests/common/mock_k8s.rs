use std::{
  collections::{HashMap, VecDeque},
  sync::Mutex,
};

use anyhow::{Result, bail};
use k8s_openapi::api::core::v1::{Node, Pod};

use eksrefresh::clients::{EvictionOutcome, K8sClients};

/// Mock K8s client for testing. Patches and evictions are recorded so tests can
/// assert on what would have been sent to the API server, and `calls` keeps the
/// order of every request.
#[derive(Default)]
pub struct MockK8sClients {
  pub nodes: Vec<Node>,
  pub pods: Vec<Pod>,
  /// Scripted eviction responses per `namespace/name`; `Evicted` once exhausted
  pub evictions: Mutex<HashMap<String, VecDeque<EvictionResponse>>>,
  /// Pods still present after eviction: `namespace/name` to the UID now using that name
  pub lingering: HashMap<String, String>,
  pub patches: Mutex<Vec<(String, serde_json::Value)>>,
  pub eviction_requests: Mutex<Vec<String>>,
  /// `patch <node>`, `evict <namespace/name>` or `get <namespace/name>`, in request order
  pub calls: Mutex<Vec<String>>,
}

/// A scripted reply for a single eviction request
#[derive(Clone, Debug)]
pub enum EvictionResponse {
  Outcome(EvictionOutcome),
  Error(String),
}

impl MockK8sClients {
  pub fn with_eviction_responses(self, pod: &str, responses: Vec<EvictionResponse>) -> Self {
    self.evictions.lock().unwrap().insert(pod.to_string(), responses.into());
    self
  }

  pub fn patches(&self) -> Vec<(String, serde_json::Value)> {
    self.patches.lock().unwrap().clone()
  }

  pub fn eviction_requests(&self) -> Vec<String> {
    self.eviction_requests.lock().unwrap().clone()
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Number of times the pod was looked up while waiting for its deletion
  pub fn existence_checks(&self, pod: &str) -> usize {
    let call = format!("get {pod}");
    self.calls().iter().filter(|c| **c == call).count()
  }
}

impl K8sClients for MockK8sClients {
  async fn list_nodes(&self) -> Result<Vec<Node>> {
    Ok(self.nodes.clone())
  }

  async fn patch_node(&self, name: &str, patch: &serde_json::Value) -> Result<()> {
    self.calls.lock().unwrap().push(format!("patch {name}"));
    self.patches.lock().unwrap().push((name.to_string(), patch.clone()));

    if !self.nodes.iter().any(|node| node.metadata.name.as_deref() == Some(name)) {
      bail!("nodes \"{name}\" not found");
    }
    Ok(())
  }

  async fn list_pods_on_node(&self, _node_name: &str) -> Result<Vec<Pod>> {
    Ok(self.pods.clone())
  }

  async fn evict_pod(&self, namespace: &str, name: &str) -> Result<EvictionOutcome> {
    let key = format!("{namespace}/{name}");
    self.calls.lock().unwrap().push(format!("evict {key}"));
    self.eviction_requests.lock().unwrap().push(key.clone());

    let response = self.evictions.lock().unwrap().get_mut(&key).and_then(|responses| responses.pop_front());
    match response {
      Some(EvictionResponse::Outcome(outcome)) => Ok(outcome),
      Some(EvictionResponse::Error(message)) => bail!("{message}"),
      None => Ok(EvictionOutcome::Evicted),
    }
  }

  async fn pod_exists(&self, namespace: &str, name: &str, uid: Option<&str>) -> Result<bool> {
    let key = format!("{namespace}/{name}");
    self.calls.lock().unwrap().push(format!("get {key}"));

    match self.lingering.get(&key) {
      Some(current) => Ok(uid.is_none() || uid == Some(current.as_str())),
      None => Ok(false),
    }
  }
}

/// Mock that returns errors for all methods
pub struct MockK8sClientsError;

impl K8sClients for MockK8sClientsError {
  async fn list_nodes(&self) -> Result<Vec<Node>> { bail!("mock K8s error") }
  async fn patch_node(&self, _name: &str, _patch: &serde_json::Value) -> Result<()> { bail!("mock K8s error") }
  async fn list_pods_on_node(&self, _node_name: &str) -> Result<Vec<Pod>> { bail!("mock K8s error") }
  async fn evict_pod(&self, _namespace: &str, _name: &str) -> Result<EvictionOutcome> { bail!("mock K8s error") }
  async fn pod_exists(&self, _namespace: &str, _name: &str, _uid: Option<&str>) -> Result<bool> {
    bail!("mock K8s error")
  }
}
