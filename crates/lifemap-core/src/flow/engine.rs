//! Flow propagation engine.
//!
//! Each non-question node starts with its own base (override, or spring
//! accrual plus matching logs, plus roots). Propagation then repeats two
//! steps:
//!
//! 1. **Distribute**: every node with positive inflow forwards it along its
//!    outgoing edges, whole along a single edge or split by weight points
//!    across several.
//! 2. **Re-accumulate**: every node's inflow becomes its base plus the flow
//!    on its incoming edges.
//!
//! Distribution reads the inflows of the previous pass only, so the result
//! does not depend on node order. The default budget is five passes; a chain
//! longer than the budget under-reports its deepest nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::base::{node_base, NodeBase};
use super::weights::{split, WeightPolicy, WeightTable};
use super::TimeWindow;
use crate::graph::{Edge, EdgeKey, GraphSnapshot, Lineage, LogEntry, Node};

/// Pass budget used by the editor.
pub const DEFAULT_PASSES: usize = 5;

/// Changes at or below this are treated as "no change" when reporting
/// whether a fixed-pass run settled.
const SETTLED_EPSILON: f64 = 1e-9;

/// How many distribute/re-accumulate passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Propagation {
    /// Exactly `n` passes.
    FixedPasses { passes: usize },
    /// Stop once no inflow moves by more than `epsilon`, after at most
    /// `max_passes` passes.
    UntilStable { epsilon: f64, max_passes: usize },
}

impl Default for Propagation {
    fn default() -> Self {
        Self::FixedPasses {
            passes: DEFAULT_PASSES,
        }
    }
}

impl Propagation {
    fn max_passes(&self) -> usize {
        match self {
            Self::FixedPasses { passes } => *passes,
            Self::UntilStable { max_passes, .. } => *max_passes,
        }
    }
}

/// Result of one flow computation.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub window: TimeWindow,
    /// Minutes accumulated at each node. Question nodes report zero.
    pub node_inflow: BTreeMap<String, f64>,
    /// Minutes forwarded along each edge, keyed `"source-target"`.
    pub edge_flow: BTreeMap<EdgeKey, f64>,
    /// Self-generated minutes per node, roots excluded.
    pub generated: BTreeMap<String, f64>,
    /// Passes actually run.
    pub passes: usize,
    /// Whether the last pass left every inflow unchanged.
    pub converged: bool,
    /// Whether the flow graph contains a cycle.
    pub cyclic: bool,
}

impl FlowReport {
    pub fn inflow(&self, node_id: &str) -> f64 {
        self.node_inflow.get(node_id).copied().unwrap_or(0.0)
    }

    pub fn edge(&self, source: &str, target: &str) -> f64 {
        self.edge_flow
            .get(&EdgeKey::new(source, target))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn generated(&self, node_id: &str) -> f64 {
        self.generated.get(node_id).copied().unwrap_or(0.0)
    }

    /// Largest inflow, used by renderers to normalise line widths.
    /// An empty map yields 1.0.
    pub fn max_inflow(&self) -> f64 {
        self.node_inflow
            .values()
            .copied()
            .reduce(f64::max)
            .unwrap_or(1.0)
    }

    pub fn total_generated(&self) -> f64 {
        self.generated.values().sum()
    }
}

/// Pure flow calculator, parameterised by the weight policy.
#[derive(Debug, Clone)]
pub struct FlowEngine<P = WeightTable> {
    policy: P,
    propagation: Propagation,
}

impl Default for FlowEngine<WeightTable> {
    fn default() -> Self {
        Self::new(WeightTable::default())
    }
}

impl<P: WeightPolicy> FlowEngine<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            propagation: Propagation::default(),
        }
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    /// Compute inflows and edge flows for `window` as seen at `now`.
    pub fn compute(
        &self,
        snapshot: &GraphSnapshot,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> FlowReport {
        let index = snapshot.index();
        let nodes: Vec<&Node> = snapshot
            .nodes
            .iter()
            .filter(|n| {
                index
                    .get(n.id.as_str())
                    .is_some_and(|first| std::ptr::eq(*first, *n))
            })
            .collect();
        let edges = snapshot.flow_edges();

        let mut outgoing: HashMap<&str, Vec<&Edge>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&Edge>> = HashMap::new();
        for edge in &edges {
            outgoing.entry(edge.source_id.as_str()).or_default().push(edge);
            incoming.entry(edge.target_id.as_str()).or_default().push(edge);
        }

        let bases: HashMap<&str, NodeBase> = nodes
            .iter()
            .map(|n| (n.id.as_str(), node_base(n, &snapshot.logs, window, now)))
            .collect();
        let mut inflow: HashMap<&str, f64> =
            bases.iter().map(|(&id, base)| (id, base.own())).collect();
        let mut edge_flow: HashMap<EdgeKey, f64> = HashMap::new();

        let lineage = Lineage::new(snapshot);
        let cyclic = lineage.has_cycle();
        if let Some(node) = lineage.find_cycle() {
            tracing::warn!(node, "flow graph has a cycle; inflows grow with every pass");
        }
        if let (Propagation::FixedPasses { passes }, Some(depth)) =
            (self.propagation, lineage.max_depth())
        {
            if depth > passes {
                tracing::warn!(
                    depth,
                    passes,
                    "hierarchy deeper than pass budget; top nodes under-report"
                );
            }
        }

        let mut passes = 0;
        // Nothing has settled until at least one pass has run.
        let mut last_delta = f64::INFINITY;
        let mut converged = false;

        for pass in 0..self.propagation.max_passes() {
            self.distribute(&nodes, &inflow, &outgoing, &mut edge_flow);

            let mut delta = 0.0_f64;
            for node in nodes.iter().filter(|n| !n.is_question()) {
                let id = node.id.as_str();
                let received: f64 = incoming
                    .get(id)
                    .map(|edges| {
                        edges
                            .iter()
                            .filter_map(|e| edge_flow.get(&e.key()))
                            .sum()
                    })
                    .unwrap_or(0.0);
                let next = bases[id].own() + received;
                let previous = inflow.insert(id, next).unwrap_or(0.0);
                delta = delta.max((next - previous).abs());
            }

            passes = pass + 1;
            last_delta = delta;
            tracing::debug!(pass = passes, delta, "propagation pass");

            if let Propagation::UntilStable { epsilon, .. } = self.propagation {
                if delta <= epsilon {
                    converged = true;
                    break;
                }
            }
        }
        if matches!(self.propagation, Propagation::FixedPasses { .. }) {
            converged = last_delta <= SETTLED_EPSILON;
        }

        FlowReport {
            window: *window,
            node_inflow: inflow
                .into_iter()
                .map(|(id, v)| (id.to_string(), v))
                .collect(),
            edge_flow: edge_flow.into_iter().collect(),
            generated: bases
                .into_iter()
                .map(|(id, b)| (id.to_string(), b.generated))
                .collect(),
            passes,
            converged,
            cyclic,
        }
    }

    fn distribute(
        &self,
        nodes: &[&Node],
        inflow: &HashMap<&str, f64>,
        outgoing: &HashMap<&str, Vec<&Edge>>,
        edge_flow: &mut HashMap<EdgeKey, f64>,
    ) {
        for node in nodes.iter().filter(|n| !n.is_question()) {
            let id = node.id.as_str();
            let total = inflow.get(id).copied().unwrap_or(0.0);
            if total <= 0.0 {
                continue;
            }
            match outgoing.get(id).map(Vec::as_slice) {
                None | Some([]) => {}
                Some([edge]) => {
                    edge_flow.insert(edge.key(), total);
                }
                Some(edges) => {
                    let weights: Vec<u8> = edges.iter().map(|e| e.weight).collect();
                    let shares = split(&self.policy, &weights, total);
                    for (edge, share) in edges.iter().zip(shares) {
                        edge_flow.insert(edge.key(), share);
                    }
                }
            }
        }
    }
}

/// Compute flow with the default weight table and five passes.
///
/// The inputs are copied into a snapshot, so the caller's collections are
/// never borrowed for longer than this call.
pub fn calculate_flow(
    nodes: &[Node],
    edges: &[Edge],
    logs: &[LogEntry],
    window: &TimeWindow,
    now: DateTime<Utc>,
) -> FlowReport {
    let snapshot = GraphSnapshot::new(nodes.to_vec(), edges.to_vec(), logs.to_vec());
    FlowEngine::default().compute(&snapshot, window, now)
}
