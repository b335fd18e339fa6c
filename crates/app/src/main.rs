mod cli;
mod shell;
mod telemetry;

use std::fmt;
use std::time::Duration;

use clap::Parser;

use quest_core::model::{SessionContext, TemplateSet};
use services::{AppServices, Clock, DirectorySource, OdooConfig, SessionSettings};

use crate::cli::{Cli, Command};

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn normalize_sqlite_url(raw: &str) -> Result<String, ArgsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: raw.to_string() });
    }
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_string());
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn directory_source(cli: &Cli) -> DirectorySource {
    match &cli.roster_file {
        Some(path) => DirectorySource::RosterFile(path.clone()),
        None => DirectorySource::Odoo(OdooConfig {
            base_url: cli.odoo_url.clone(),
            session_id: cli.odoo_session.clone(),
        }),
    }
}

fn session_settings(cli: &Cli) -> SessionSettings {
    SessionSettings {
        session_size: cli.count,
        reveal_delay: Duration::from_millis(cli.reveal_ms),
        templates: if cli.job_titles {
            TemplateSet::with_job_titles()
        } else {
            TemplateSet::default()
        },
        seed: cli.seed,
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = normalize_sqlite_url(&cli.db_url)?;
    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&db_url)?;
    let services = AppServices::new_sqlite(
        &db_url,
        Clock::default(),
        directory_source(&cli),
        session_settings(&cli),
    )
    .await?;

    match cli.command {
        Command::Play {
            company,
            department,
        } => {
            let session_loop = services.session_loop();
            shell::play(&session_loop, SessionContext::new(company, department)).await
        }
        Command::Scores => {
            let board = services.scores().read().await?;
            if board.is_empty() {
                println!("No scores recorded yet.");
                return Ok(());
            }
            for record in board.scores() {
                println!(
                    "{}  {:>3}  {}",
                    record.date.format("%Y-%m-%d %H:%M"),
                    record.score,
                    record.description
                );
            }
            println!(
                "{} sessions, average {:.1}",
                board.num_scores(),
                board.average()
            );
            Ok(())
        }
        Command::ResetScores => {
            services.scores().clear().await?;
            println!("Scoreboard cleared.");
            Ok(())
        }
        Command::Companies => {
            for company in services.directory().companies().await? {
                println!("{:>6}  {}", company.id.value(), company.name);
            }
            Ok(())
        }
        Command::Departments => {
            for department in services.directory().departments().await? {
                println!("{:>6}  {}", department.id.value(), department.name);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json, cli.log_level);

    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
