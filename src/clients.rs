use anyhow::Result;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, EvictParams, ListParams, Patch, PatchParams};

use crate::error::Error;

/// Result of a single eviction request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvictionOutcome {
  /// The eviction was accepted by the API server
  Evicted,
  /// The pod no longer exists
  NotFound,
  /// The eviction was refused for now (429 from a PodDisruptionBudget, or 500 from conflicting budgets)
  Blocked(String),
}

/// Trait abstracting all Kubernetes API operations used by eksrefresh
pub trait K8sClients {
  fn list_nodes(&self) -> impl std::future::Future<Output = Result<Vec<Node>>> + Send;
  fn patch_node(&self, name: &str, patch: &serde_json::Value) -> impl std::future::Future<Output = Result<()>> + Send;
  fn list_pods_on_node(&self, node_name: &str) -> impl std::future::Future<Output = Result<Vec<Pod>>> + Send;
  fn evict_pod(&self, namespace: &str, name: &str) -> impl std::future::Future<Output = Result<EvictionOutcome>> + Send;
  /// Whether the pod still exists; when `uid` is given, a pod recreated under the same name does not count
  fn pod_exists(
    &self,
    namespace: &str,
    name: &str,
    uid: Option<&str>,
  ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Trait abstracting the SSM Parameter Store operations used by eksrefresh
pub trait SsmClients {
  /// Returns the value of the named parameter, `None` when the response carries no value
  fn get_parameter(&self, name: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
}

/// Real Kubernetes client implementation wrapping kube-rs
pub struct RealK8sClients {
  client: kube::Client,
}

impl RealK8sClients {
  pub async fn new() -> Result<Self, Error> {
    match kube::Client::try_default().await {
      Ok(client) => Ok(Self { client }),
      Err(e) => Err(Error::Configuration(format!(
        "Unable to connect to cluster: {e}\n\n\
        Ensure kubeconfig file is present and updated to connect to the cluster.\n\
        Try: aws eks update-kubeconfig --name <CLUSTER_NAME>"
      ))),
    }
  }

  fn namespaced_pods(&self, namespace: &str) -> Api<Pod> {
    Api::namespaced(self.client.clone(), namespace)
  }
}

impl K8sClients for RealK8sClients {
  async fn list_nodes(&self) -> Result<Vec<Node>> {
    let api: Api<Node> = Api::all(self.client.clone());
    let node_list = api.list(&Default::default()).await?;

    Ok(node_list.items)
  }

  async fn patch_node(&self, name: &str, patch: &serde_json::Value) -> Result<()> {
    let patch: json_patch::Patch = serde_json::from_value(patch.clone())?;
    let api: Api<Node> = Api::all(self.client.clone());
    api
      .patch(name, &PatchParams::default(), &Patch::Json::<()>(patch))
      .await?;

    Ok(())
  }

  async fn list_pods_on_node(&self, node_name: &str) -> Result<Vec<Pod>> {
    let api: Api<Pod> = Api::all(self.client.clone());
    let params = ListParams::default().fields(&format!("spec.nodeName={node_name}"));
    let pod_list = api.list(&params).await?;

    Ok(pod_list.items)
  }

  async fn evict_pod(&self, namespace: &str, name: &str) -> Result<EvictionOutcome> {
    let api = self.namespaced_pods(namespace);

    match api.evict(name, &EvictParams::default()).await {
      Ok(_) => Ok(EvictionOutcome::Evicted),
      Err(kube::Error::Api(e)) => match e.code {
        404 => Ok(EvictionOutcome::NotFound),
        429 | 500 => Ok(EvictionOutcome::Blocked(e.message.to_string())),
        _ => Err(kube::Error::Api(e).into()),
      },
      Err(e) => Err(e.into()),
    }
  }

  async fn pod_exists(&self, namespace: &str, name: &str, uid: Option<&str>) -> Result<bool> {
    let api = self.namespaced_pods(namespace);

    match api.get_opt(name).await? {
      Some(pod) => Ok(uid.is_none() || pod.metadata.uid.as_deref() == uid),
      None => Ok(false),
    }
  }
}

/// Real SSM client implementation wrapping the SDK client
pub struct RealSsmClients {
  ssm: aws_sdk_ssm::Client,
}

impl RealSsmClients {
  pub fn new(config: &aws_config::SdkConfig) -> Self {
    Self {
      ssm: aws_sdk_ssm::Client::new(config),
    }
  }
}

impl SsmClients for RealSsmClients {
  async fn get_parameter(&self, name: &str) -> Result<Option<String>> {
    let response = self.ssm.get_parameter().name(name).send().await?;

    Ok(response.parameter.and_then(|parameter| parameter.value))
  }
}
