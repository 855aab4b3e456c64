use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::assignment::{DEFAULT_PLACEMENTS, DEFAULT_VARIANTS};
use crate::ctr::DEFAULT_Z;

#[derive(Parser, Debug)]
#[command(
    name = "ctrlab",
    version,
    about = "Stateless experiment assignment and CTR statistics over a local event log"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true, env = "DB_PATH", default_value = "ctr.db")]
    pub db_path: PathBuf,

    #[arg(
        long,
        global = true,
        env = "SECRET",
        default_value = "changeme",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub secret: String,

    #[arg(
        long = "variants",
        global = true,
        value_delimiter = ',',
        default_values = DEFAULT_VARIANTS
    )]
    pub variants: Vec<String>,

    #[arg(
        long = "placements",
        global = true,
        value_delimiter = ',',
        default_values = DEFAULT_PLACEMENTS
    )]
    pub placements: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Assign(AssignArgs),
    RegisterUser(RegisterUserArgs),
    StartSession(StartSessionArgs),
    Search(SearchArgs),
    Impression(ImpressionArgs),
    Click(ClickArgs),
    Ingest(IngestArgs),
    Stats(StatsArgs),
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct AssignArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterUserArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long, default_value = "")]
    pub ua: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StartSessionArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub session_id: String,

    #[arg(long, default_value = "")]
    pub referrer: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub session_id: String,

    #[arg(long = "q", default_value = "")]
    pub query: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImpressionArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub session_id: String,

    #[arg(long)]
    pub variant: String,

    #[arg(long)]
    pub placement: String,

    #[arg(long)]
    pub creative_id: String,

    #[arg(long)]
    pub visible_ms: i64,

    #[arg(long)]
    pub viewport_w: i64,

    #[arg(long)]
    pub viewport_h: i64,

    #[arg(long, default_value = "")]
    pub ua: String,

    #[arg(long, default_value = "")]
    pub ip: String,
}

#[derive(Args, Debug, Clone)]
pub struct ClickArgs {
    #[arg(long)]
    pub user_id: String,

    #[arg(long)]
    pub session_id: String,

    #[arg(long)]
    pub variant: String,

    #[arg(long)]
    pub placement: String,

    #[arg(long)]
    pub creative_id: String,

    #[arg(long, default_value = "")]
    pub ua: String,

    #[arg(long, default_value = "")]
    pub ip: String,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Newline-delimited JSON, one event object per line tagged by "type".
    #[arg(long)]
    pub events: PathBuf,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Html,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, default_value_t = DEFAULT_Z)]
    pub z: f64,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[arg(long)]
    pub output: Option<PathBuf>,
}
