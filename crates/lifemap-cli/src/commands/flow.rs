use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use lifemap_core::error::Result;
use lifemap_core::{Config, FlowReport, GraphSnapshot, TimeRange, TimeWindow};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Args)]
pub struct FlowArgs {
    /// Snapshot JSON with `nodes`, `edges` and `logs`
    snapshot: PathBuf,
    /// Reporting range: d, w, m or y (defaults to flow.default_range)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    range: Option<TimeRange>,
    /// Custom window start date (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,
    /// Custom window end date, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
    /// Evaluate as of this instant (RFC 3339) instead of the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,
    /// Also report Year inflows next to the selected window
    #[arg(long)]
    year: bool,
    /// Read engine settings from this file instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct FlowOutput {
    #[serde(flatten)]
    report: FlowReport,
    max_inflow: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    year_inflow: Option<BTreeMap<String, f64>>,
}

pub fn run(args: FlowArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };
    let snapshot = GraphSnapshot::load(&args.snapshot)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let window = match (args.from, args.to) {
        (Some(start), Some(end)) => TimeWindow::custom(start, end)?,
        _ => TimeWindow::from(args.range.unwrap_or(config.flow.default_range)),
    };

    let engine = config.engine();
    tracing::info!(%window, nodes = snapshot.nodes.len(), "computing flow");
    let report = engine.compute(&snapshot, &window, now);

    let year_inflow = args
        .year
        .then(|| engine.compute(&snapshot, &TimeWindow::YEAR, now).node_inflow);

    let output = FlowOutput {
        max_inflow: report.max_inflow(),
        report,
        year_inflow,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
