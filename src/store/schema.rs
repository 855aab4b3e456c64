use super::*;

pub(super) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
              user_id TEXT PRIMARY KEY,
              ua TEXT,
              created_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS sessions (
              session_id TEXT PRIMARY KEY,
              user_id TEXT,
              referrer TEXT,
              created_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS impressions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              ts INTEGER,
              user_id TEXT,
              session_id TEXT,
              variant TEXT,
              creative_id TEXT,
              visible_ms INTEGER,
              viewport_w INTEGER,
              viewport_h INTEGER,
              ua TEXT,
              ip TEXT
            );

            CREATE TABLE IF NOT EXISTS clicks (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              ts INTEGER,
              user_id TEXT,
              session_id TEXT,
              variant TEXT,
              creative_id TEXT,
              ua TEXT,
              ip TEXT
            );

            CREATE TABLE IF NOT EXISTS searches (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              ts INTEGER,
              user_id TEXT,
              session_id TEXT,
              query_text TEXT,
              result_count INTEGER
            );
            ",
        )
        .context("failed to create event tables")?;

    ensure_column_exists(connection, "impressions", "placement TEXT")?;
    ensure_column_exists(connection, "clicks", "placement TEXT")?;

    connection
        .execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_searches_session ON searches(session_id);
            CREATE INDEX IF NOT EXISTS idx_impressions_session ON impressions(session_id);
            CREATE INDEX IF NOT EXISTS idx_clicks_session ON clicks(session_id);
            ",
        )
        .context("failed to create event indexes")?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<Option<String>> {
    let version = connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'db_schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .context("failed to read db_schema_version")?;
    Ok(version)
}

pub(super) fn ensure_column_exists(
    connection: &Connection,
    table_name: &str,
    column_definition: &str,
) -> Result<()> {
    let Some(column_name) = column_definition.split_whitespace().next() else {
        bail!("invalid column definition: {column_definition}");
    };

    let pragma_sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to inspect schema for table {table_name}"))?;

    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let existing_name: String = row.get(1)?;
        if existing_name == column_name {
            return Ok(());
        }
    }

    let alter_sql = format!("ALTER TABLE {table_name} ADD COLUMN {column_definition}");
    connection
        .execute(&alter_sql, [])
        .with_context(|| format!("failed to add column {column_name} on {table_name}"))?;

    Ok(())
}
