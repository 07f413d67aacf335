use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use k8s_openapi::{
  api::core::v1::{Node, NodeStatus, NodeSystemInfo, Pod, PodStatus},
  apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference, Time},
};

use eksrefresh::release::Clock;

/// Clock frozen at 2024-01-02 15:04:05 UTC
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
  fn default() -> Self {
    Self(Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap())
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}

/// Creates a Node with the given kubelet version and architecture
pub fn make_node(name: &str, kubelet_version: &str, architecture: &str) -> Node {
  Node {
    metadata: ObjectMeta {
      name: Some(name.into()),
      creation_timestamp: Some(serde_json::from_value::<Time>(serde_json::json!("2024-03-15T08:30:00Z")).unwrap()),
      ..Default::default()
    },
    status: Some(NodeStatus {
      node_info: Some(NodeSystemInfo {
        kubelet_version: kubelet_version.into(),
        architecture: architecture.into(),
        ..Default::default()
      }),
      ..Default::default()
    }),
    ..Default::default()
  }
}

/// Creates a running Pod owned by the given controller kind, with UID `<name>-uid`
pub fn make_pod(namespace: &str, name: &str, owner_kind: Option<&str>) -> Pod {
  Pod {
    metadata: ObjectMeta {
      name: Some(name.into()),
      namespace: Some(namespace.into()),
      uid: Some(format!("{name}-uid")),
      owner_references: owner_kind.map(|kind| {
        vec![OwnerReference {
          kind: kind.into(),
          name: format!("{name}-owner"),
          controller: Some(true),
          ..Default::default()
        }]
      }),
      ..Default::default()
    },
    status: Some(PodStatus {
      phase: Some("Running".into()),
      ..Default::default()
    }),
    ..Default::default()
  }
}

/// Creates a static mirror Pod as created by the kubelet
pub fn make_mirror_pod(namespace: &str, name: &str) -> Pod {
  let mut pod = make_pod(namespace, name, None);
  pod.metadata.annotations = Some(BTreeMap::from([(
    "kubernetes.io/config.mirror".to_string(),
    "f1b2c3".to_string(),
  )]));
  pod
}
