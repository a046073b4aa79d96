use chrono::{DateTime, Utc};
use clap::Args;
use lifemap_core::error::Result;
use lifemap_core::graph::last_activity;
use lifemap_core::{GraphSnapshot, Lineage, Node, ValidationError};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct LineageArgs {
    /// Snapshot JSON with `nodes`, `edges` and `logs`
    snapshot: PathBuf,
    /// Node to inspect
    node_id: String,
}

#[derive(Serialize)]
struct LineageOutput<'a> {
    id: &'a str,
    label: &'a str,
    passive_sources: Vec<&'a str>,
    contributors: Vec<&'a str>,
    last_activity: Option<DateTime<Utc>>,
}

fn ids(nodes: Vec<&Node>) -> Vec<&str> {
    let mut ids: Vec<&str> = nodes.into_iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    ids
}

pub fn run(args: LineageArgs) -> Result<()> {
    let snapshot = GraphSnapshot::load(&args.snapshot)?;
    let node = snapshot
        .node(&args.node_id)
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "node_id".into(),
            message: format!("no node with id '{}'", args.node_id),
        })?;

    let lineage = Lineage::new(&snapshot);
    let output = LineageOutput {
        id: &node.id,
        label: &node.label,
        passive_sources: ids(lineage.passive_sources(&node.id)),
        contributors: ids(lineage.contributors(&node.id)),
        last_activity: last_activity(node, &snapshot.logs),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
