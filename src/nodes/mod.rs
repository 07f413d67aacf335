mod drain;
mod queue;
mod resources;

pub use drain::{DrainSummary, cordon_and_drain, drain_node};
pub use queue::NodeQueue;
pub use resources::{NodeRecord, UNSCHEDULABLE_PATCH_PATH, cordon_node, list_nodes};
