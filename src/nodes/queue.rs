use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  error::{Error, Result},
  nodes::NodeRecord,
};

/// FIFO sequence of nodes awaiting refresh
///
/// Operations consume the queue and hand back the updated one. Duplicate
/// node names are kept as-is; re-running an inventory without clearing the
/// queue appends the same nodes again.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeQueue {
  records: VecDeque<NodeRecord>,
}

impl NodeQueue {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends the record at the tail
  pub fn enqueue(mut self, record: NodeRecord) -> Self {
    debug!("Enqueued: {}", record.name);
    self.records.push_back(record);
    self
  }

  /// Removes the record at the head, returning it along with the remaining queue
  pub fn dequeue(mut self) -> Result<(NodeRecord, Self)> {
    let record = self.records.pop_front().ok_or(Error::EmptyQueue)?;
    debug!("Dequeued: {}", record.name);

    Ok((record, self))
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
    self.records.iter()
  }
}

impl FromIterator<NodeRecord> for NodeQueue {
  fn from_iter<I: IntoIterator<Item = NodeRecord>>(iter: I) -> Self {
    Self {
      records: iter.into_iter().collect(),
    }
  }
}

impl IntoIterator for NodeQueue {
  type Item = NodeRecord;
  type IntoIter = std::collections::vec_deque::IntoIter<NodeRecord>;

  fn into_iter(self) -> Self::IntoIter {
    self.records.into_iter()
  }
}
