use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

use quest_core::model::{CompanyId, DepartmentId};
use services::session::{DEFAULT_REVEAL_DELAY, DEFAULT_SESSION_SIZE};

#[derive(Debug, Parser)]
#[command(name = "quest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Guess your colleagues from the company directory", long_about = None)]
pub struct Cli {
    /// SQLite database holding the scoreboard
    #[arg(long = "db", env = "QUEST_DB_URL", default_value = "sqlite://quest.sqlite3", global = true)]
    pub db_url: String,

    /// Base URL of the Odoo instance to read employees from
    #[arg(long, env = "QUEST_ODOO_URL", default_value = "https://www.odoo.com", global = true)]
    pub odoo_url: String,

    /// `session_id` cookie of a logged-in Odoo session
    #[arg(long, env = "QUEST_ODOO_SESSION", hide_env_values = true, global = true)]
    pub odoo_session: Option<String>,

    /// JSON roster file to play from instead of Odoo
    #[arg(long, env = "QUEST_ROSTER_FILE", global = true)]
    pub roster_file: Option<PathBuf>,

    /// Colleagues asked about per session
    #[arg(long, env = "QUEST_SESSION_SIZE", default_value_t = DEFAULT_SESSION_SIZE, global = true)]
    pub count: usize,

    /// Milliseconds the right answer stays on screen
    #[arg(long, env = "QUEST_REVEAL_MS", default_value_t = default_reveal_ms(), global = true)]
    pub reveal_ms: u64,

    /// Also ask for job titles
    #[arg(long, env = "QUEST_JOB_TITLES", global = true)]
    pub job_titles: bool,

    /// Seed for a reproducible session
    #[arg(long, env = "QUEST_SEED", global = true)]
    pub seed: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "QUEST_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: Level,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "QUEST_LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Play one session against a company department
    Play {
        #[arg(long)]
        company: CompanyId,
        #[arg(long)]
        department: DepartmentId,
    },
    /// Show every recorded score and the rolling average
    Scores,
    /// Delete the scoreboard
    ResetScores,
    /// List companies in the directory
    Companies,
    /// List top-level departments in the directory
    Departments,
}

fn default_reveal_ms() -> u64 {
    u64::try_from(DEFAULT_REVEAL_DELAY.as_millis()).unwrap_or(u64::MAX)
}
