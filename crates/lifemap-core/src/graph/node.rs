//! Life-map nodes.
//!
//! Field names follow the editor's JSON document so that a saved map can be
//! fed to the engine without a translation layer. Canvas position, icon and
//! socket fields are accepted and ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::flow::TimeRange;

/// Category value that marks a source as continuously producing.
pub const SPRING_CATEGORY: &str = "spring";

/// Kind of vertex in the life map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Top-level life objective
    Hub,
    /// Sub-goal
    Bed,
    /// Project or milestone
    Plant,
    /// Resource or time input
    Source,
    /// Inert annotation, excluded from flow
    Question,
}

/// Lifecycle state shown by the editor. Has no effect on flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Active,
    Dormant,
    Decaying,
    Completed,
}

/// Pre-logged retroactive effort attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub hours: f64,
}

impl Root {
    pub fn new(label: impl Into<String>, hours: f64) -> Self {
        let label = label.into();
        Self {
            id: format!("r-{label}"),
            label,
            hours,
        }
    }

    pub fn minutes(&self) -> f64 {
        self.hours * 60.0
    }
}

/// Optional node attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Weekly capacity in hours. Only springs use it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<Root>,
    /// Manual overrides in hours, keyed by range code (`D`, `W`, `M`, `Y`).
    #[serde(
        default,
        rename = "debugHours",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub debug_hours: BTreeMap<String, Option<f64>>,
}

/// A vertex in the life map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: NodeMeta,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: label.into(),
            status: NodeStatus::Active,
            created_at: None,
            meta: NodeMeta::default(),
        }
    }

    /// Builder: mark as a spring with the given weekly capacity in hours.
    pub fn with_spring(mut self, capacity_hours: f64) -> Self {
        self.meta.category = Some(SPRING_CATEGORY.to_string());
        self.meta.capacity = Some(capacity_hours);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.meta.category = Some(category.into());
        self
    }

    pub fn with_capacity(mut self, capacity_hours: f64) -> Self {
        self.meta.capacity = Some(capacity_hours);
        self
    }

    pub fn with_root(mut self, label: impl Into<String>, hours: f64) -> Self {
        self.meta.roots.push(Root::new(label, hours));
        self
    }

    pub fn with_override(mut self, range: TimeRange, hours: f64) -> Self {
        self.meta
            .debug_hours
            .insert(range.code().to_string(), Some(hours));
        self
    }

    pub fn is_question(&self) -> bool {
        self.node_type == NodeType::Question
    }

    /// A source whose category marks it as continuously producing.
    pub fn is_spring(&self) -> bool {
        self.node_type == NodeType::Source
            && self.meta.category.as_deref() == Some(SPRING_CATEGORY)
    }

    /// Weekly capacity in hours, zero when unset.
    pub fn capacity_hours(&self) -> f64 {
        self.meta.capacity.unwrap_or(0.0)
    }

    /// Sum of all historical roots, in minutes.
    pub fn root_minutes(&self) -> f64 {
        self.meta.roots.iter().map(Root::minutes).sum()
    }

    /// Manual override for `range` converted to minutes.
    ///
    /// Negative and non-finite entries are treated as absent.
    pub fn override_minutes(&self, range: TimeRange) -> Option<f64> {
        self.meta
            .debug_hours
            .get(range.code())
            .copied()
            .flatten()
            .filter(|hours| hours.is_finite() && *hours >= 0.0)
            .map(|hours| hours * 60.0)
    }

    /// Case-insensitive comparison against the node label.
    pub fn label_matches(&self, name: &str) -> bool {
        !self.label.is_empty() && self.label.to_lowercase() == name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_requires_source_type_and_category() {
        let spring = Node::new("a", NodeType::Source, "Day job").with_spring(40.0);
        assert!(spring.is_spring());

        let course = Node::new("b", NodeType::Source, "Course").with_category("course");
        assert!(!course.is_spring());

        let mut bed = Node::new("c", NodeType::Bed, "Goal");
        bed.meta.category = Some(SPRING_CATEGORY.into());
        assert!(!bed.is_spring());
    }

    #[test]
    fn root_minutes_sums_all_roots() {
        let node = Node::new("g", NodeType::Hub, "Life")
            .with_root("2025 retro", 40.0)
            .with_root("Old notes", 1.5);
        assert_eq!(node.root_minutes(), 2490.0);
    }

    #[test]
    fn override_ignores_negative_and_missing_values() {
        let mut node = Node::new("n", NodeType::Bed, "Goal").with_override(TimeRange::Week, 2.0);
        node.meta.debug_hours.insert("D".into(), Some(-1.0));
        node.meta.debug_hours.insert("Y".into(), None);

        assert_eq!(node.override_minutes(TimeRange::Week), Some(120.0));
        assert_eq!(node.override_minutes(TimeRange::Day), None);
        assert_eq!(node.override_minutes(TimeRange::Year), None);
        assert_eq!(node.override_minutes(TimeRange::Month), None);
    }

    #[test]
    fn deserializes_editor_document() {
        let json = r#"{
            "id": "r1",
            "type": "source",
            "label": "My Day Job",
            "status": "active",
            "x": 100,
            "y": 700,
            "icon_key": "Briefcase",
            "createdAt": "2026-01-01T00:00:00Z",
            "meta": { "category": "spring", "capacity": 40, "debugHours": { "M": 5, "W": null } }
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type, NodeType::Source);
        assert!(node.is_spring());
        assert_eq!(node.capacity_hours(), 40.0);
        assert_eq!(node.override_minutes(TimeRange::Month), Some(300.0));
        assert_eq!(node.override_minutes(TimeRange::Week), None);
        assert!(node.created_at.is_some());
    }

    #[test]
    fn label_match_is_case_insensitive() {
        let node = Node::new("n", NodeType::Plant, "Illustration Book");
        assert!(node.label_matches("illustration book"));
        assert!(!node.label_matches("illustration"));
        assert!(!Node::new("e", NodeType::Plant, "").label_matches(""));
    }
}
