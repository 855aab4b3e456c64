use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::store::{self, EVENT_TABLES};

pub fn run(db_path: &Path) -> Result<()> {
    info!(db = %db_path.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let schema_version = store::schema_version(&connection).unwrap_or(None);
    info!(
        path = %db_path.display(),
        schema_version = %schema_version.unwrap_or_else(|| "unknown".to_string()),
        "database status"
    );

    for table in EVENT_TABLES {
        match store::table_count(&connection, table) {
            Ok(rows) => info!(table, rows, "table status"),
            Err(err) => warn!(table, error = %err, "table unavailable"),
        }
    }

    match store::valid_session_count(&connection) {
        Ok(valid_sessions) => info!(valid_sessions, "valid sessions (>=1 search)"),
        Err(err) => warn!(error = %err, "valid session count unavailable"),
    }

    Ok(())
}
