//! fanlog CLI
//!
//! Read-only inspection of a fanlog relational store.
//!
//! ## Usage
//!
//! ```bash
//! # List every logging session recorded in the store
//! fanlog sessions
//!
//! # Show the rows written by one session
//! fanlog logs --session 01J9ZQ3V6W8K2M4N5P7R9T0XYZ
//!
//! # Errors in a time window (epoch millis or RFC 3339)
//! fanlog query --from 2026-10-19T08:00:00+02:00 --to 1760860800000 --severity error
//!
//! # Use another store file, emit JSON lines
//! fanlog --store /var/log/app/logs.redb --json sessions
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, TimeZone};
use clap::{Parser, Subcommand};
use fanlog_core::store::DEFAULT_STORE_PATH;
use fanlog_core::{LogQuery, LogRow, LogStore, SessionId, SessionRow, Severity};

/// fanlog - inspect persisted log sessions
#[derive(Parser)]
#[command(name = "fanlog")]
#[command(version = "0.1.0")]
#[command(about = "Inspect sessions and log rows in a fanlog store")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Store file written by the relational sink
    #[arg(short, long, global = true, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Print one JSON object per row instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recorded sessions
    Sessions,

    /// Show the log rows of one session
    Logs {
        /// Session id (ULID)
        #[arg(long)]
        session: String,
    },

    /// Filter log rows across all sessions
    Query {
        /// Earliest timestamp, inclusive (epoch millis or RFC 3339)
        #[arg(long)]
        from: Option<String>,

        /// Latest timestamp, inclusive (epoch millis or RFC 3339)
        #[arg(long)]
        to: Option<String>,

        /// Exact severity (debug, info, warn, error, fatal)
        #[arg(long)]
        severity: Option<String>,
    },
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Open an existing store; never create one as a side effect of reading.
fn open_store(path: &Path) -> Result<LogStore> {
    if !path.exists() {
        bail!("Store not found: {}", path.display());
    }
    LogStore::open(path).with_context(|| format!("Failed to open store {}", path.display()))
}

/// Parse epoch milliseconds or an RFC 3339 timestamp.
fn parse_time(s: &str) -> Result<i64> {
    if let Ok(ms) = s.parse::<i64>() {
        return Ok(ms);
    }
    let parsed = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid time '{}': expected epoch millis or RFC 3339", s))?;
    Ok(parsed.timestamp_millis())
}

fn format_millis(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => ms.to_string(),
    }
}

fn print_session(row: &SessionRow, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(row)?);
    } else {
        println!(
            "{:>4}  {}  {}",
            row.id,
            row.session_id,
            format_millis(row.start_time_ms)
        );
    }
    Ok(())
}

fn print_log(row: &LogRow, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(row)?);
    } else {
        println!(
            "{:>6}  {}  {:<5}  {}:{} {}()  {}",
            row.id,
            format_millis(row.time_ms),
            row.severity,
            row.file.as_deref().unwrap_or("-"),
            row.line,
            row.caller.as_deref().unwrap_or(""),
            row.message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let store = open_store(&cli.store)?;
    tracing::debug!(store = %store.path().display(), "Opened store");

    match cli.command {
        Commands::Sessions => {
            let sessions = store.sessions()?;
            if sessions.is_empty() && !cli.json {
                println!("No sessions recorded.");
            }
            for row in &sessions {
                print_session(row, cli.json)?;
            }
        }

        Commands::Logs { session } => {
            let session = SessionId::from_string(&session)
                .with_context(|| format!("Invalid session id '{}'", session))?;
            let rows = store.logs_for_session(&session.to_string())?;
            if rows.is_empty() && !cli.json {
                println!("No log rows for session {}.", session);
            }
            for row in &rows {
                print_log(row, cli.json)?;
            }
        }

        Commands::Query { from, to, severity } => {
            let query = LogQuery {
                start_ms: from.as_deref().map(parse_time).transpose()?,
                end_ms: to.as_deref().map(parse_time).transpose()?,
                severity: severity
                    .as_deref()
                    .map(str::parse::<Severity>)
                    .transpose()?,
            };
            tracing::info!(?query, "Querying store");

            let rows = store.query(&query)?;
            for row in &rows {
                print_log(row, cli.json)?;
            }
            if !cli.json {
                println!("{} row(s)", rows.len());
            }
        }
    }

    Ok(())
}
