//! fanlog demo
//!
//! Enables a set of sinks, logs one event per severity through the macros,
//! prints what the ring buffer kept and shuts the session down.
//!
//! ```bash
//! fanlog-demo --sinks console,memory --level info
//! fanlog-demo --sinks all --store /tmp/demo.redb --file /tmp/demo.log
//! fanlog-demo --config fanlog.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fanlog_core::format::{content, header};
use fanlog_core::{ColorMode, Engine, Severity, SinkConfig, SinkMask};

const BANNER_WIDTH: usize = 60;

/// Fan one event per severity out to the selected sinks
#[derive(Parser)]
#[command(name = "fanlog-demo")]
#[command(version = "0.1.0")]
#[command(about = "Fan one event per severity out to the selected sinks")]
struct Args {
    /// Increase verbosity of fanlog's own diagnostics (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Sinks to enable: all, none, or a list of console,debug,file,memory,relational
    #[arg(long, default_value = "console,memory")]
    sinks: SinkMask,

    /// Minimum severity for every sink
    #[arg(long)]
    level: Option<Severity>,

    /// Ring buffer capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Log file path (default: ./log/<timestamp> <session>.log)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Relational store path
    #[arg(long)]
    store: Option<PathBuf>,

    /// Disable terminal colors
    #[arg(long)]
    no_color: bool,

    /// JSON sink configuration; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
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

fn load_config(args: &Args) -> Result<SinkConfig> {
    let mut config = match &args.config {
        Some(path) => SinkConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SinkConfig::default(),
    };

    if let Some(level) = args.level {
        config = config.with_level(level);
    }
    if let Some(capacity) = args.capacity {
        config = config.with_ring_capacity(capacity);
    }
    if let Some(file) = &args.file {
        config = config.with_file_path(file);
    }
    if let Some(store) = &args.store {
        config = config.with_store_path(store);
    }
    if args.no_color {
        config = config.with_color(ColorMode::Never);
    }
    Ok(config)
}

fn run(engine: &Engine) {
    fanlog_core::debug!(engine, "cache primed with {} entries", 128);
    fanlog_core::info!(engine, "listening on port {}", 8080);
    fanlog_core::warn!(engine, "slow response: {} ms", 950);
    fanlog_core::error!(engine, "request {} failed", "req-7");
    fanlog_core::fatal!(engine, "worker pool exhausted");
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose);

    let config = load_config(&args)?;
    let engine = Engine::new();
    engine.enable(args.sinks, &config)?;

    run(&engine);

    let held = engine.all();
    print!("{}", header(" ring buffer ", BANNER_WIDTH));
    if held.is_empty() {
        print!("{}", content("(memory sink not enabled or nothing kept)", BANNER_WIDTH));
    }
    for event in &held {
        let line = format!(
            "{:<5} {}",
            event.severity().as_str(),
            event.message().unwrap_or_default()
        );
        print!("{}", content(&line, BANNER_WIDTH));
    }
    print!("{}", header("", BANNER_WIDTH));

    engine.disable();
    Ok(())
}
