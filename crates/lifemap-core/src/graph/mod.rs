//! Life-map graph model.
//!
//! Nodes, edges and activity logs as the editor stores them, the immutable
//! snapshot the flow engine reads, and upstream lineage queries.

mod edge;
mod lineage;
mod log;
mod node;
mod snapshot;

pub use edge::{dedup_edges, Edge, EdgeKey, EdgeKind};
pub use lineage::{last_activity, Lineage};
pub use log::LogEntry;
pub use node::{Node, NodeMeta, NodeStatus, NodeType, Root, SPRING_CATEGORY};
pub use snapshot::GraphSnapshot;
