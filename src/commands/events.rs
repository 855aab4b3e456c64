use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::{ClickArgs, ImpressionArgs};
use crate::model::{ClickRecord, ImpressionRecord};
use crate::store;
use crate::util::now_epoch_millis;

pub fn record_impression(args: ImpressionArgs, db_path: &Path) -> Result<()> {
    let record = ImpressionRecord {
        user_id: args.user_id,
        session_id: args.session_id,
        variant: args.variant,
        placement: args.placement,
        creative_id: args.creative_id,
        visible_ms: args.visible_ms,
        viewport_w: args.viewport_w,
        viewport_h: args.viewport_h,
        ua: args.ua,
        ip: args.ip,
        ts: None,
    };
    record.validate()?;

    let connection = store::open_store(db_path)?;
    store::insert_impression(&connection, &record, now_epoch_millis())?;
    info!(
        session_id = %record.session_id,
        variant = %record.variant,
        placement = %record.placement,
        creative_id = %record.creative_id,
        visible_ms = record.visible_ms,
        "logged impression"
    );

    Ok(())
}

pub fn record_click(args: ClickArgs, db_path: &Path) -> Result<()> {
    let record = ClickRecord {
        user_id: args.user_id,
        session_id: args.session_id,
        variant: args.variant,
        placement: args.placement,
        creative_id: args.creative_id,
        ua: args.ua,
        ip: args.ip,
        ts: None,
    };
    record.validate()?;

    let connection = store::open_store(db_path)?;
    store::insert_click(&connection, &record, now_epoch_millis())?;
    info!(
        session_id = %record.session_id,
        variant = %record.variant,
        placement = %record.placement,
        creative_id = %record.creative_id,
        "logged click"
    );

    Ok(())
}
