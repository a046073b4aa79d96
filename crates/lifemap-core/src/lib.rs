//! # Lifemap Core Library
//!
//! This library provides the core logic behind the life-map editor: a graph
//! of goals, resources and projects through which logged effort ("flow")
//! propagates from leaf resources up to root objectives. The editor and the
//! CLI are thin layers over the same core.
//!
//! ## Architecture
//!
//! - **Graph**: nodes, edges and activity logs as the editor stores them,
//!   an immutable [`GraphSnapshot`], and upstream [`Lineage`] queries
//! - **Flow**: the pure [`FlowEngine`], which computes per-node inflow and
//!   per-edge flow for a [`TimeWindow`]
//! - **Storage**: TOML configuration for the engine's tunables
//!
//! ## Key Components
//!
//! - [`FlowEngine`]: flow propagation with an injectable [`WeightPolicy`]
//! - [`FlowReport`]: inflow and edge-flow maps consumed by renderers
//! - [`Config`]: engine configuration management

pub mod error;
pub mod flow;
pub mod graph;
pub mod storage;

pub use error::{ConfigError, CoreError, SnapshotError, ValidationError};
pub use flow::{
    calculate_flow, FlowEngine, FlowReport, Propagation, TimeRange, TimeWindow, WeightPolicy,
    WeightTable,
};
pub use graph::{Edge, EdgeKey, GraphSnapshot, Lineage, LogEntry, Node, NodeType};
pub use storage::Config;
