use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::cli::IngestArgs;
use crate::model::EventLine;
use crate::store;
use crate::util::now_epoch_millis;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    pub users_inserted: usize,
    pub users_existing: usize,
    pub sessions_inserted: usize,
    pub sessions_existing: usize,
    pub searches: usize,
    pub impressions: usize,
    pub clicks: usize,
    pub blank_lines: usize,
}

pub fn run(args: IngestArgs, db_path: &Path) -> Result<()> {
    let raw = fs::read_to_string(&args.events)
        .with_context(|| format!("failed to read {}", args.events.display()))?;

    info!(
        events = %args.events.display(),
        db = %db_path.display(),
        "starting event ingest"
    );

    let mut connection = store::open_store(db_path)?;
    let counts = ingest_lines(&mut connection, &raw, now_epoch_millis())
        .with_context(|| format!("failed to ingest {}", args.events.display()))?;

    info!(
        users_inserted = counts.users_inserted,
        users_existing = counts.users_existing,
        sessions_inserted = counts.sessions_inserted,
        sessions_existing = counts.sessions_existing,
        searches = counts.searches,
        impressions = counts.impressions,
        clicks = counts.clicks,
        blank_lines = counts.blank_lines,
        "event ingest completed"
    );

    Ok(())
}

/// Append every event in `raw` inside one transaction. Any malformed line
/// rolls the whole batch back. Lines without their own `ts` are stamped with
/// the batch time `ts`.
pub fn ingest_lines(connection: &mut Connection, raw: &str, ts: i64) -> Result<IngestCounts> {
    let tx = connection.transaction()?;
    let mut counts = IngestCounts::default();

    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            counts.blank_lines += 1;
            continue;
        }

        let event: EventLine = serde_json::from_str(line)
            .with_context(|| format!("line {line_number}: invalid event"))?;

        match event {
            EventLine::User(record) => {
                record
                    .validate()
                    .with_context(|| format!("line {line_number}: invalid user event"))?;
                if store::insert_user(&tx, &record, record.ts.unwrap_or(ts))? {
                    counts.users_inserted += 1;
                } else {
                    counts.users_existing += 1;
                }
            }
            EventLine::Session(record) => {
                record
                    .validate()
                    .with_context(|| format!("line {line_number}: invalid session event"))?;
                if store::insert_session(&tx, &record, record.ts.unwrap_or(ts))? {
                    counts.sessions_inserted += 1;
                } else {
                    counts.sessions_existing += 1;
                }
            }
            EventLine::Search(record) => {
                record
                    .validate()
                    .with_context(|| format!("line {line_number}: invalid search event"))?;
                store::insert_search(&tx, &record, record.ts.unwrap_or(ts))?;
                counts.searches += 1;
            }
            EventLine::Impression(record) => {
                record
                    .validate()
                    .with_context(|| format!("line {line_number}: invalid impression event"))?;
                store::insert_impression(&tx, &record, record.ts.unwrap_or(ts))?;
                counts.impressions += 1;
            }
            EventLine::Click(record) => {
                record
                    .validate()
                    .with_context(|| format!("line {line_number}: invalid click event"))?;
                store::insert_click(&tx, &record, record.ts.unwrap_or(ts))?;
                counts.clicks += 1;
            }
        }
    }

    tx.commit().context("failed to commit ingested events")?;
    Ok(counts)
}
