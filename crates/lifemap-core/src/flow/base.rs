//! Per-node base generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TimeWindow;
use crate::graph::{LogEntry, Node};

/// Where a node's self-generated minutes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    /// Manual override for the window's range.
    Override,
    /// Spring capacity accrual plus matching logs.
    Computed,
    /// Question nodes never generate.
    Excluded,
}

/// Minutes a node contributes on its own, before anything flows in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeBase {
    /// Override, or passive accrual plus logs. Excludes roots.
    pub generated: f64,
    /// Historical roots, added regardless of window and override.
    pub root_minutes: f64,
    pub source: GenerationSource,
}

impl NodeBase {
    pub const EXCLUDED: Self = Self {
        generated: 0.0,
        root_minutes: 0.0,
        source: GenerationSource::Excluded,
    };

    /// Inflow of the node with nothing received from upstream.
    pub fn own(&self) -> f64 {
        self.generated + self.root_minutes
    }
}

/// Compute the base for one node.
///
/// Priority: an override for the window's range replaces everything else;
/// otherwise spring accrual and matching logs are added together. Roots are
/// always kept separately.
pub fn node_base(
    node: &Node,
    logs: &[LogEntry],
    window: &TimeWindow,
    now: DateTime<Utc>,
) -> NodeBase {
    if node.is_question() {
        return NodeBase::EXCLUDED;
    }

    let root_minutes = node.root_minutes();

    if let Some(minutes) = node.override_minutes(window.override_range()) {
        return NodeBase {
            generated: minutes,
            root_minutes,
            source: GenerationSource::Override,
        };
    }

    let mut generated = 0.0;
    if node.is_spring() && node.capacity_hours() > 0.0 {
        generated += node.capacity_hours() * 60.0 * window.time_scale();
    }
    generated += logs
        .iter()
        .filter(|log| log.matches(node) && window.contains(log.timestamp, now))
        .map(|log| log.elapsed_minutes)
        .sum::<f64>();

    NodeBase {
        generated,
        root_minutes,
        source: GenerationSource::Computed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::TimeRange;
    use crate::graph::NodeType;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn override_replaces_capacity_and_logs() {
        let node = Node::new("a", NodeType::Source, "Job")
            .with_spring(10.0)
            .with_override(TimeRange::Month, 5.0)
            .with_root("Before", 1.0);
        let logs = vec![LogEntry::new(now() - Duration::days(2), 45.0).for_node("a")];

        let base = node_base(&node, &logs, &TimeWindow::MONTH, now());
        assert_eq!(base.generated, 300.0);
        assert_eq!(base.root_minutes, 60.0);
        assert_eq!(base.source, GenerationSource::Override);
        assert_eq!(base.own(), 360.0);
    }

    #[test]
    fn override_for_other_range_is_ignored() {
        let node = Node::new("a", NodeType::Bed, "Goal").with_override(TimeRange::Year, 5.0);
        let base = node_base(&node, &[], &TimeWindow::WEEK, now());
        assert_eq!(base.generated, 0.0);
        assert_eq!(base.source, GenerationSource::Computed);
    }

    #[test]
    fn spring_accrual_adds_logs_on_top() {
        let node = Node::new("a", NodeType::Source, "Job").with_spring(10.0);
        let logs = vec![
            LogEntry::new(now() - Duration::days(3), 90.0).with_course("job"),
            LogEntry::new(now() - Duration::days(10), 30.0).for_node("a"),
        ];
        let base = node_base(&node, &logs, &TimeWindow::WEEK, now());
        assert_eq!(base.generated, 600.0 + 90.0);
    }

    #[test]
    fn non_spring_capacity_is_ignored() {
        let node = Node::new("a", NodeType::Source, "Course")
            .with_category("course")
            .with_capacity(10.0);
        let base = node_base(&node, &[], &TimeWindow::WEEK, now());
        assert_eq!(base.generated, 0.0);
    }

    #[test]
    fn question_is_excluded_even_with_roots() {
        let node = Node::new("q", NodeType::Question, "Why")
            .with_root("Notes", 3.0)
            .with_override(TimeRange::Week, 1.0);
        let base = node_base(&node, &[], &TimeWindow::WEEK, now());
        assert_eq!(base, NodeBase::EXCLUDED);
    }
}
