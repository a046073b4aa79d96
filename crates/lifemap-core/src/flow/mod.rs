//! Flow propagation.
//!
//! Given a graph snapshot, a reporting window and the current time, compute
//! how many minutes each node has accumulated and how much each edge
//! forwards. The computation is pure: no clock, no shared state, and the
//! snapshot is only read.

mod base;
mod engine;
mod weights;
mod window;

pub use base::{node_base, GenerationSource, NodeBase};
pub use engine::{calculate_flow, FlowEngine, FlowReport, Propagation, DEFAULT_PASSES};
pub use weights::{split, WeightPolicy, WeightTable};
pub use window::{TimeRange, TimeWindow};
