//! SQLite-backed append-only event log: users, sessions, searches,
//! impressions and clicks, plus the grouped CTR query over valid sessions.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{
    ClickRecord, EventCount, ImpressionRecord, SearchRecord, SessionRecord, UserRecord,
};
use crate::util::{ensure_parent_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "0.2.0";

mod aggregate;
mod events;
mod schema;
#[cfg(test)]
mod tests;

pub use aggregate::{grouped_counts, table_count, valid_session_count};
pub use events::{insert_click, insert_impression, insert_search, insert_session, insert_user};
pub use schema::{ensure_schema, schema_version};

pub const EVENT_TABLES: [&str; 5] = ["users", "sessions", "searches", "impressions", "clicks"];

/// Open (creating if needed) the event store and bring its schema up to date.
pub fn open_store(db_path: &Path) -> Result<Connection> {
    ensure_parent_directory(db_path)?;

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    schema::configure_connection(&connection)?;
    ensure_schema(&connection)?;

    Ok(connection)
}

/// Open an existing event store for reading. Neither schema nor metadata is
/// touched, so `db_updated_at` keeps tracking the last write.
pub fn open_existing(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        bail!("event database not found: {}", db_path.display());
    }

    Connection::open(db_path).with_context(|| format!("failed to open {}", db_path.display()))
}
