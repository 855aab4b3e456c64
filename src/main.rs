mod assignment;
mod cli;
mod commands;
mod ctr;
mod model;
mod store;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::assignment::ExperimentConfig;
use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let experiment = ExperimentConfig::new(
        cli.global.secret.as_bytes(),
        cli.global.variants.clone(),
        cli.global.placements.clone(),
    )
    .context("invalid experiment configuration")?;
    debug!(
        variants = ?experiment.variants(),
        placements = ?experiment.placements(),
        db = %cli.global.db_path.display(),
        "experiment configured"
    );
    let db_path = cli.global.db_path.as_path();

    match cli.command {
        Commands::Assign(args) => commands::assign::run(args, &experiment),
        Commands::RegisterUser(args) => {
            commands::identity::register_user(args, db_path, &experiment)
        }
        Commands::StartSession(args) => {
            commands::identity::start_session(args, db_path, &experiment)
        }
        Commands::Search(args) => commands::search::run(args, db_path),
        Commands::Impression(args) => commands::events::record_impression(args, db_path),
        Commands::Click(args) => commands::events::record_click(args, db_path),
        Commands::Ingest(args) => commands::ingest::run(args, db_path),
        Commands::Stats(args) => commands::stats::run(args, db_path),
        Commands::Status => commands::status::run(db_path),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
