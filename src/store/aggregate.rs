use super::*;

/// Impression and click counts per (variant, placement, creative), restricted
/// to sessions that logged at least one search.
///
/// Both event streams are counted independently and clicks are left-joined
/// onto impression groups: a group without clicks reports zero, and a group
/// with clicks but no impressions is not reported at all.
pub fn grouped_counts(connection: &Connection) -> Result<Vec<EventCount>> {
    let mut statement = connection
        .prepare(
            "
            WITH valid_sessions AS (
              SELECT DISTINCT session_id FROM searches
            ),
            imp AS (
              SELECT i.variant, i.placement, i.creative_id, COUNT(*) AS imps
              FROM impressions i
              WHERE i.session_id IN (SELECT session_id FROM valid_sessions)
              GROUP BY i.variant, i.placement, i.creative_id
            ),
            clk AS (
              SELECT c.variant, c.placement, c.creative_id, COUNT(*) AS clicks
              FROM clicks c
              WHERE c.session_id IN (SELECT session_id FROM valid_sessions)
              GROUP BY c.variant, c.placement, c.creative_id
            )
            SELECT
              COALESCE(imp.variant, ''),
              COALESCE(imp.placement, ''),
              COALESCE(imp.creative_id, ''),
              imp.imps,
              COALESCE(clk.clicks, 0)
            FROM imp
            LEFT JOIN clk
              ON imp.variant IS clk.variant
             AND imp.placement IS clk.placement
             AND imp.creative_id IS clk.creative_id
            ORDER BY imp.variant, imp.placement, imp.creative_id
            ",
        )
        .context("failed to prepare grouped CTR query")?;

    let mut rows = statement.query([])?;
    let mut out = Vec::new();

    while let Some(row) = rows.next()? {
        let impressions: i64 = row.get(3)?;
        let clicks: i64 = row.get(4)?;
        out.push(EventCount {
            variant: row.get(0)?,
            placement: row.get(1)?,
            creative_id: row.get(2)?,
            impressions: impressions.max(0) as u64,
            clicks: clicks.max(0) as u64,
        });
    }

    Ok(out)
}

pub fn valid_session_count(connection: &Connection) -> Result<u64> {
    let count: i64 = connection
        .query_row("SELECT COUNT(DISTINCT session_id) FROM searches", [], |row| {
            row.get(0)
        })
        .context("failed to count valid sessions")?;
    Ok(count.max(0) as u64)
}

pub fn table_count(connection: &Connection, table_name: &str) -> Result<i64> {
    if !EVENT_TABLES.contains(&table_name) {
        bail!("unknown event table: {table_name}");
    }

    let sql = format!("SELECT COUNT(*) FROM {table_name}");
    let count = connection
        .query_row(&sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows in {table_name}"))?;
    Ok(count)
}
