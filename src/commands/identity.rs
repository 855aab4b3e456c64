use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::assignment::ExperimentConfig;
use crate::cli::{RegisterUserArgs, StartSessionArgs};
use crate::commands::assign::write_assignment;
use crate::model::{AssignmentResponse, SessionRecord, UserRecord};
use crate::store;
use crate::util::now_epoch_millis;

pub fn register_user(
    args: RegisterUserArgs,
    db_path: &Path,
    experiment: &ExperimentConfig,
) -> Result<()> {
    let record = UserRecord {
        user_id: args.user_id,
        ua: args.ua,
        ts: None,
    };
    record.validate()?;

    let connection = store::open_store(db_path)?;
    let inserted = store::insert_user(&connection, &record, now_epoch_millis())?;

    let cell = experiment.assign(&record.user_id);
    info!(
        user_id = %record.user_id,
        new_user = inserted,
        variant = cell.variant,
        placement = cell.placement,
        "registered user"
    );

    write_assignment(
        &AssignmentResponse {
            ok: true,
            user_id: &record.user_id,
            variant: cell.variant,
            placement: cell.placement,
        },
        args.json,
    )
}

pub fn start_session(
    args: StartSessionArgs,
    db_path: &Path,
    experiment: &ExperimentConfig,
) -> Result<()> {
    let record = SessionRecord {
        user_id: args.user_id,
        session_id: args.session_id,
        referrer: args.referrer,
        ts: None,
    };
    record.validate()?;

    let connection = store::open_store(db_path)?;
    let inserted = store::insert_session(&connection, &record, now_epoch_millis())?;

    let cell = experiment.assign(&record.user_id);
    info!(
        user_id = %record.user_id,
        session_id = %record.session_id,
        new_session = inserted,
        variant = cell.variant,
        placement = cell.placement,
        "started session"
    );

    write_assignment(
        &AssignmentResponse {
            ok: true,
            user_id: &record.user_id,
            variant: cell.variant,
            placement: cell.placement,
        },
        args.json,
    )
}
