use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;
use tracing::{debug, error, info};

use crate::{
  clients::K8sClients,
  error::{Error, Result},
  nodes::NodeQueue,
};

/// JSON pointer of the field toggled when cordoning a node
pub const UNSCHEDULABLE_PATCH_PATH: &str = "/spec/unschedulable";

/// Node details as viewed from the Kubernetes API
///
/// A point-in-time snapshot; records are never updated after creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct NodeRecord {
  #[serde(rename = "nodeName")]
  pub name: String,
  #[serde(rename = "nodeVersion")]
  #[tabled(rename = "KUBELET VERSION")]
  pub kubelet_version: String,
  #[serde(rename = "nodeArch")]
  #[tabled(rename = "ARCH")]
  pub architecture: String,
  #[serde(rename = "creationTimestamp")]
  #[tabled(rename = "CREATED")]
  pub creation_timestamp: String,
}

impl From<&Node> for NodeRecord {
  fn from(node: &Node) -> Self {
    let node_info = node.status.as_ref().and_then(|status| status.node_info.as_ref());

    NodeRecord {
      name: node.name_any(),
      kubelet_version: node_info.map(|info| info.kubelet_version.to_owned()).unwrap_or_default(),
      architecture: node_info.map(|info| info.architecture.to_owned()).unwrap_or_default(),
      creation_timestamp: node
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|time| time.0.to_string())
        .unwrap_or_default(),
    }
  }
}

/// Appends every node in the cluster to the queue provided
///
/// A failed list call is logged and the queue is handed back untouched, so
/// callers always receive a (possibly empty) inventory
pub async fn list_nodes<C: K8sClients>(client: &C, queue: NodeQueue) -> NodeQueue {
  let nodes = match client.list_nodes().await {
    Ok(nodes) => nodes,
    Err(err) => {
      error!("Error getting nodes: {err}");
      return queue;
    }
  };

  debug!("Found {} nodes", nodes.len());
  nodes.iter().map(NodeRecord::from).fold(queue, NodeQueue::enqueue)
}

/// Marks the given node as unschedulable, preventing new pods from being placed onto it
///
/// Existence of the node is not checked beforehand; a missing node surfaces as the patch error
pub async fn cordon_node<C: K8sClients>(client: &C, name: &str) -> Result<()> {
  let patch = json!([
    { "op": "replace", "path": UNSCHEDULABLE_PATCH_PATH, "value": true }
  ]);

  match client.patch_node(name, &patch).await {
    Ok(()) => {
      info!("Cordoned node {name}");
      Ok(())
    }
    Err(err) => {
      error!("Unable to cordon node {name}: {err}");
      Err(Error::transport(format!("Cordon node {name}"), err))
    }
  }
}
