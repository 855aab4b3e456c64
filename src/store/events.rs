use super::*;

/// Returns `false` when the user already existed.
pub fn insert_user(connection: &Connection, record: &UserRecord, ts: i64) -> Result<bool> {
    let inserted = connection
        .execute(
            "INSERT OR IGNORE INTO users(user_id, ua, created_at) VALUES(?1, ?2, ?3)",
            params![record.user_id, record.ua, ts],
        )
        .with_context(|| format!("failed to insert user {}", record.user_id))?;
    Ok(inserted > 0)
}

/// Returns `false` when the session already existed.
pub fn insert_session(connection: &Connection, record: &SessionRecord, ts: i64) -> Result<bool> {
    let inserted = connection
        .execute(
            "INSERT OR IGNORE INTO sessions(session_id, user_id, referrer, created_at)
             VALUES(?1, ?2, ?3, ?4)",
            params![record.session_id, record.user_id, record.referrer, ts],
        )
        .with_context(|| format!("failed to insert session {}", record.session_id))?;
    Ok(inserted > 0)
}

pub fn insert_search(connection: &Connection, record: &SearchRecord, ts: i64) -> Result<()> {
    connection
        .execute(
            "INSERT INTO searches(ts, user_id, session_id, query_text, result_count)
             VALUES(?1, ?2, ?3, ?4, ?5)",
            params![
                ts,
                record.user_id,
                record.session_id,
                record.query_text.trim(),
                record.result_count
            ],
        )
        .with_context(|| format!("failed to log search for session {}", record.session_id))?;
    Ok(())
}

pub fn insert_impression(
    connection: &Connection,
    record: &ImpressionRecord,
    ts: i64,
) -> Result<()> {
    connection
        .execute(
            "
            INSERT INTO impressions(
              ts, user_id, session_id, variant, placement, creative_id,
              visible_ms, viewport_w, viewport_h, ua, ip
            ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                ts,
                record.user_id,
                record.session_id,
                record.variant,
                record.placement,
                record.creative_id,
                record.visible_ms,
                record.viewport_w,
                record.viewport_h,
                record.ua,
                record.ip
            ],
        )
        .with_context(|| {
            format!(
                "failed to log impression of {} for session {}",
                record.creative_id, record.session_id
            )
        })?;
    Ok(())
}

pub fn insert_click(connection: &Connection, record: &ClickRecord, ts: i64) -> Result<()> {
    connection
        .execute(
            "
            INSERT INTO clicks(
              ts, user_id, session_id, variant, placement, creative_id, ua, ip
            ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                ts,
                record.user_id,
                record.session_id,
                record.variant,
                record.placement,
                record.creative_id,
                record.ua,
                record.ip
            ],
        )
        .with_context(|| {
            format!(
                "failed to log click on {} for session {}",
                record.creative_id, record.session_id
            )
        })?;
    Ok(())
}
