use std::io::{self, Write};

use anyhow::Result;
use tracing::debug;

use crate::assignment::ExperimentConfig;
use crate::cli::AssignArgs;
use crate::model::AssignmentResponse;
use crate::util::{require_non_empty, write_json_stdout};

pub fn run(args: AssignArgs, experiment: &ExperimentConfig) -> Result<()> {
    require_non_empty("user_id", &args.user_id)?;

    let cell = experiment.assign(&args.user_id);
    debug!(
        user_id = %args.user_id,
        variant = cell.variant,
        placement = cell.placement,
        "assigned experiment cell"
    );

    let response = AssignmentResponse {
        ok: true,
        user_id: &args.user_id,
        variant: cell.variant,
        placement: cell.placement,
    };
    write_assignment(&response, args.json)
}

pub(crate) fn write_assignment(response: &AssignmentResponse<'_>, json: bool) -> Result<()> {
    if json {
        return write_json_stdout(response);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(
        output,
        "{}\tvariant={}\tplacement={}",
        response.user_id, response.variant, response.placement
    )?;
    output.flush()?;
    Ok(())
}
