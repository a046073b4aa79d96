//! Immutable graph snapshot handed to the flow engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{dedup_edges, Edge, LogEntry, Node};
use crate::error::SnapshotError;

/// Owned copy of the editor's nodes, edges and logs.
///
/// The engine only ever borrows a snapshot, so callers are free to keep
/// editing their own collections while a computation runs on a copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>, logs: Vec<LogEntry>) -> Self {
        Self { nodes, edges, logs }
    }

    /// Parse a `{ "nodes": [...], "edges": [...], "logs": [...] }` document.
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| SnapshotError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let snapshot = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            logs = snapshot.logs.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Id -> node lookup. The first node wins when ids repeat.
    pub fn index(&self) -> HashMap<&str, &Node> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }
        index
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges that take part in propagation.
    ///
    /// Duplicates are collapsed, and edges with a missing endpoint or a
    /// question endpoint are dropped.
    pub fn flow_edges(&self) -> Vec<Edge> {
        let index = self.index();
        dedup_edges(&self.edges)
            .into_iter()
            .filter(|edge| {
                let endpoints = (
                    index.get(edge.source_id.as_str()),
                    index.get(edge.target_id.as_str()),
                );
                match endpoints {
                    (Some(source), Some(target)) => !source.is_question() && !target.is_question(),
                    _ => {
                        tracing::trace!(edge = %edge.key(), "skipping edge with unknown endpoint");
                        false
                    }
                }
            })
            .collect()
    }
}
