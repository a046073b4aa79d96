//! Directed, weighted links between nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Visual style of a link. Has no effect on flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    ActiveStream,
    Groundwater,
}

fn default_weight() -> u8 {
    1
}

/// Flow moves from `source_id` (contributor) to `target_id` (receiver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    /// Relative-share hint, only consulted when a node has several outgoing edges.
    #[serde(default = "default_weight")]
    pub weight: u8,
    #[serde(default, rename = "type")]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            weight: default_weight(),
            kind: EdgeKind::ActiveStream,
        }
    }

    pub fn with_weight(mut self, weight: u8) -> Self {
        self.weight = weight;
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(&self.source_id, &self.target_id)
    }
}

/// Ordered `(source, target)` pair identifying an edge.
///
/// Rendered as `"source-target"`, the key format the rendering layer reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
}

impl EdgeKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

impl Serialize for EdgeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Remove repeated `(source, target)` pairs, keeping the first occurrence.
pub fn dedup_edges(edges: &[Edge]) -> Vec<Edge> {
    let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(edges.len());
    edges
        .iter()
        .filter(|e| seen.insert((e.source_id.as_str(), e.target_id.as_str())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let edges = vec![
            Edge::new("a", "b").with_weight(2),
            Edge::new("a", "c"),
            Edge::new("a", "b").with_weight(3),
            Edge::new("b", "a"),
        ];
        let unique = dedup_edges(&edges);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].weight, 2);
        assert_eq!(unique[2].key(), EdgeKey::new("b", "a"));
    }

    #[test]
    fn key_display_joins_with_dash() {
        assert_eq!(EdgeKey::new("r1", "s1-1").to_string(), "r1-s1-1");
    }

    #[test]
    fn weight_and_kind_default_when_missing() {
        let edge: Edge = serde_json::from_str(r#"{"source_id":"a","target_id":"b"}"#).unwrap();
        assert_eq!(edge.weight, 1);
        assert_eq!(edge.kind, EdgeKind::ActiveStream);

        let edge: Edge = serde_json::from_str(
            r#"{"source_id":"a","target_id":"b","weight":2,
                "type":"groundwater","source_socket":"top"}"#,
        )
        .unwrap();
        assert_eq!(edge.weight, 2);
        assert_eq!(edge.kind, EdgeKind::Groundwater);
    }
}
