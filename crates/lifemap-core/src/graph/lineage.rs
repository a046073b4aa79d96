//! Upstream queries over the life map.
//!
//! The editor highlights where a node's flow comes from: the springs that
//! feed it, every contributing node, and when it last saw activity. The same
//! graph view is used to detect cycles and measure hierarchy depth, which
//! bound how far a fixed number of propagation passes can reach.

use chrono::{DateTime, Utc};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use super::{dedup_edges, GraphSnapshot, LogEntry, Node};

/// Directed graph views over one snapshot.
pub struct Lineage<'a> {
    /// Edges that carry flow (no question endpoints).
    flow: DiGraph<&'a Node, ()>,
    /// Every deduplicated edge with known endpoints, questions included.
    links: DiGraph<&'a Node, ()>,
    ids: HashMap<&'a str, NodeIndex>,
}

impl<'a> Lineage<'a> {
    pub fn new(snapshot: &'a GraphSnapshot) -> Self {
        let mut flow = DiGraph::new();
        let mut links = DiGraph::new();
        let mut ids = HashMap::with_capacity(snapshot.nodes.len());

        for node in &snapshot.nodes {
            if ids.contains_key(node.id.as_str()) {
                continue;
            }
            let ix = flow.add_node(node);
            links.add_node(node);
            ids.insert(node.id.as_str(), ix);
        }

        for edge in dedup_edges(&snapshot.edges) {
            let (Some(&s), Some(&t)) = (
                ids.get(edge.source_id.as_str()),
                ids.get(edge.target_id.as_str()),
            ) else {
                continue;
            };
            links.add_edge(s, t, ());
            if !links[s].is_question() && !links[t].is_question() {
                flow.add_edge(s, t, ());
            }
        }

        Self { flow, links, ids }
    }

    /// Springs with positive capacity linked, directly or transitively, into
    /// `node_id`. Links through question nodes count.
    pub fn passive_sources(&self, node_id: &str) -> Vec<&'a Node> {
        self.upstream(&self.links, node_id)
            .into_iter()
            .filter(|n| n.is_spring() && n.capacity_hours() > 0.0)
            .collect()
    }

    /// Every node linked, directly or transitively, into `node_id`.
    pub fn contributors(&self, node_id: &str) -> Vec<&'a Node> {
        self.upstream(&self.links, node_id)
    }

    fn upstream(&self, graph: &DiGraph<&'a Node, ()>, node_id: &str) -> Vec<&'a Node> {
        let Some(&start) = self.ids.get(node_id) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([start]);
        let mut stack = vec![start];
        let mut found = Vec::new();

        while let Some(current) = stack.pop() {
            for prev in graph.neighbors_directed(current, Direction::Incoming) {
                if seen.insert(prev) {
                    found.push(graph[prev]);
                    stack.push(prev);
                }
            }
        }
        found
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.flow)
    }

    /// Id of some node that sits on a flow cycle.
    pub fn find_cycle(&self) -> Option<&'a str> {
        let cycle = toposort(&self.flow, None).err()?;
        let node: &'a Node = self.flow[cycle.node_id()];
        Some(node.id.as_str())
    }

    /// Longest chain of flow edges, or `None` when the flow graph is cyclic.
    pub fn max_depth(&self) -> Option<usize> {
        let order = toposort(&self.flow, None).ok()?;
        let mut depth = vec![0usize; self.flow.node_count()];
        let mut deepest = 0;
        for ix in order {
            let here = depth[ix.index()];
            deepest = deepest.max(here);
            for next in self.flow.neighbors_directed(ix, Direction::Outgoing) {
                depth[next.index()] = depth[next.index()].max(here + 1);
            }
        }
        Some(deepest)
    }
}

/// Timestamp of the newest log attributed to `node`.
pub fn last_activity(node: &Node, logs: &[LogEntry]) -> Option<DateTime<Utc>> {
    logs.iter()
        .filter(|log| log.matches(node))
        .map(|log| log.timestamp)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, NodeType};

    fn ids(nodes: Vec<&Node>) -> Vec<String> {
        let mut ids: Vec<String> = nodes.into_iter().map(|n| n.id.clone()).collect();
        ids.sort();
        ids
    }

    fn sample() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Node::new("job", NodeType::Source, "Day job").with_spring(40.0),
                Node::new("idle", NodeType::Source, "Idle").with_spring(0.0),
                Node::new("course", NodeType::Source, "Course").with_category("course"),
                Node::new("money", NodeType::Bed, "Financial Freedom"),
                Node::new("q", NodeType::Question, "Worth it?"),
                Node::new("life", NodeType::Hub, "Life"),
            ],
            vec![
                Edge::new("job", "money"),
                Edge::new("idle", "money"),
                Edge::new("course", "q"),
                Edge::new("q", "life"),
                Edge::new("money", "life"),
            ],
            vec![],
        )
    }

    #[test]
    fn passive_sources_are_positive_springs_upstream() {
        let snapshot = sample();
        let lineage = Lineage::new(&snapshot);
        assert_eq!(ids(lineage.passive_sources("life")), vec!["job"]);
        assert!(lineage.passive_sources("unknown").is_empty());
    }

    #[test]
    fn passive_sources_reach_through_question_links() {
        let snapshot = GraphSnapshot::new(
            vec![
                Node::new("r", NodeType::Source, "Rent").with_spring(10.0),
                Node::new("q", NodeType::Question, "Keep it?"),
                Node::new("g", NodeType::Hub, "Life"),
            ],
            vec![Edge::new("r", "q"), Edge::new("q", "g")],
            vec![],
        );
        let lineage = Lineage::new(&snapshot);
        assert_eq!(ids(lineage.passive_sources("g")), vec!["r"]);
        assert_eq!(ids(lineage.passive_sources("q")), vec!["r"]);
        assert!(!lineage.has_cycle());
    }

    #[test]
    fn contributors_include_question_links() {
        let snapshot = sample();
        let lineage = Lineage::new(&snapshot);
        assert_eq!(
            ids(lineage.contributors("life")),
            vec!["course", "idle", "job", "money", "q"]
        );
    }

    #[test]
    fn depth_and_cycles() {
        let snapshot = sample();
        let lineage = Lineage::new(&snapshot);
        assert!(!lineage.has_cycle());
        assert_eq!(lineage.max_depth(), Some(2));

        let mut cyclic = sample();
        cyclic.edges.push(Edge::new("life", "money"));
        let lineage = Lineage::new(&cyclic);
        assert!(lineage.has_cycle());
        assert!(lineage.find_cycle().is_some());
        assert_eq!(lineage.max_depth(), None);
        assert_eq!(ids(lineage.contributors("money")).len(), 5);
    }

    #[test]
    fn last_activity_picks_newest_match() {
        let node = Node::new("m1", NodeType::Plant, "Book");
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
        let logs = vec![
            LogEntry::new(at("2026-01-01T10:00:00Z"), 10.0).for_node("m1"),
            LogEntry::new(at("2026-02-01T10:00:00Z"), 10.0).with_task("book"),
            LogEntry::new(at("2026-03-01T10:00:00Z"), 10.0).for_node("other"),
        ];
        assert_eq!(last_activity(&node, &logs), Some(at("2026-02-01T10:00:00Z")));
        assert_eq!(last_activity(&node, &[]), None);
    }
}
