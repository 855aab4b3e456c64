use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::cli::{ReportFormat, StatsArgs};
use crate::ctr;
use crate::model::{CtrReport, CtrRow};
use crate::store;
use crate::util::{ensure_parent_directory, now_utc_string};

mod render;

use render::{render_html, render_text};

pub fn run(args: StatsArgs, db_path: &Path) -> Result<()> {
    let z = ctr::validate_z(args.z)?;
    let connection = store::open_existing(db_path)?;

    let report = build_report(&connection, z)?;
    info!(
        db = %db_path.display(),
        valid_sessions = report.valid_sessions,
        groups = report.rows.len(),
        z = report.z,
        "computed CTR statistics"
    );

    let rendered = render(args.format, &report)?;
    match args.output.as_deref() {
        Some(path) => {
            ensure_parent_directory(path)?;
            fs::write(path, rendered)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            info!(path = %path.display(), format = ?args.format, "wrote report");
        }
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            output.write_all(rendered.as_bytes())?;
            output.flush()?;
        }
    }

    Ok(())
}

pub fn build_report(connection: &Connection, z: f64) -> Result<CtrReport> {
    let counts = store::grouped_counts(connection)?;
    let valid_sessions = store::valid_session_count(connection)?;

    Ok(CtrReport {
        generated_at: now_utc_string(),
        valid_sessions,
        z,
        rows: ctr::summarize(counts, z),
    })
}

fn render(format: ReportFormat, report: &CtrReport) -> Result<String> {
    let rendered = match format {
        ReportFormat::Text => render_text(report),
        ReportFormat::Html => render_html(report),
        ReportFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(report).context("failed to serialize json report")?;
            json.push('\n');
            json
        }
    };
    Ok(rendered)
}

fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn format_interval(row: &CtrRow) -> String {
    format!(
        "[{}, {}]",
        format_percent(row.ci_lower),
        format_percent(row.ci_upper)
    )
}

/// Two-sided confidence level for the common quantiles, raw `z` otherwise.
fn confidence_label(z: f64) -> String {
    match z {
        z if (z - 1.645).abs() < 1e-3 => "90%".to_string(),
        z if (z - 1.96).abs() < 1e-3 => "95%".to_string(),
        z if (z - 2.576).abs() < 1e-3 => "99%".to_string(),
        z => format!("z={z}"),
    }
}
