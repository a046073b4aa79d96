//! Time-stamped activity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::Node;

/// One completed activity, attributed to a node by id or by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: String,
    /// Direct node reference. An empty string in the source document means "none".
    #[serde(default, deserialize_with = "non_empty")]
    pub node_id: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub task_name: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub course_name: Option<String>,
    #[serde(default)]
    pub elapsed_minutes: f64,
    pub timestamp: DateTime<Utc>,
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, elapsed_minutes: f64) -> Self {
        Self {
            id: String::new(),
            node_id: None,
            task_name: None,
            course_name: None,
            elapsed_minutes,
            timestamp,
        }
    }

    pub fn for_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course_name = Some(course.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task_name = Some(task.into());
        self
    }

    /// Whether this entry counts toward `node`.
    ///
    /// A direct id reference matches, and so does a course or task name equal
    /// to the node label ignoring case. Several nodes sharing a label all match.
    pub fn matches(&self, node: &Node) -> bool {
        if self.node_id.as_deref() == Some(node.id.as_str()) {
            return true;
        }
        self.course_name
            .as_deref()
            .is_some_and(|name| node.label_matches(name))
            || self
                .task_name
                .as_deref()
                .is_some_and(|name| node.label_matches(name))
    }
}
