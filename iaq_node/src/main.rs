//! # IAQ Node Binary
//!
//! Indoor air quality monitoring node: samples temperature, CO2 and
//! humidity, reports them under a rate limit and sounds the buzzer on
//! abnormal readings.
//!
//! # Usage
//!
//! ```bash
//! # Simulation backend with a fixed seed
//! iaq_node -s --seed 42 -v
//!
//! # Board with sysfs devices
//! iaq_node --config /etc/iaq/node.toml
//!
//! # JSON logs, JSON-lines reports on stdout
//! iaq_node -s --json --report-json
//! ```

use clap::Parser;
use iaq_common::config::{Backend, ConfigError, ConfigLoader, LogLevel, NodeConfig};
use iaq_common::consts::DEFAULT_CONFIG_PATH;
use iaq_common::device::ReportingSink;
use iaq_node::drivers::{self, sink::JsonLinesSink, sink::TracingSink};
use iaq_node::MonitorNode;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// IAQ Node - indoor air quality monitoring node
#[derive(Parser, Debug)]
#[command(name = "iaq_node")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Indoor air quality monitoring node")]
#[command(long_about = None)]
struct Args {
    /// Path to node configuration file (node.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Force the simulation backend
    #[arg(short = 's', long)]
    simulate: bool,

    /// Seed for the simulation backend
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Write reports as JSON lines to stdout instead of logging them
    #[arg(long)]
    report_json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("IAQ node failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(&args);
    let log_level = loaded
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);
    let mut config = loaded?;

    info!("IAQ node v{} starting...", env!("CARGO_PKG_VERSION"));

    if args.simulate {
        info!("Simulation mode enabled");
        config.driver.backend = Backend::Simulation;
    }
    if let Some(seed) = args.seed {
        config.driver.simulation.seed = Some(seed);
    }

    let devices = drivers::open(&config.driver)?;
    let sink: Arc<dyn ReportingSink> = if args.report_json {
        Arc::new(JsonLinesSink::new(Box::new(std::io::stdout())))
    } else {
        Arc::new(TracingSink)
    };

    let mut node = MonitorNode::new(config, devices, sink)?;

    let signal = node.shutdown_signal();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        signal.trigger();
    })?;

    node.start()?;
    node.shutdown_signal().wait();
    node.shutdown()?;

    info!("IAQ node shutdown complete");
    Ok(())
}

/// Load the config file. A missing default file falls back to built-in
/// defaults; a missing explicit file is an error.
fn load_config(args: &Args) -> Result<NodeConfig, ConfigError> {
    match &args.config {
        Some(path) => NodeConfig::load(path),
        None => match NodeConfig::load(&PathBuf::from(DEFAULT_CONFIG_PATH)) {
            Err(ConfigError::FileNotFound) => Ok(NodeConfig::default()),
            other => other,
        },
    }
}

fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        log_level.as_directive().parse().unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }

    if args.config.is_none() {
        info!("No --config given, using {DEFAULT_CONFIG_PATH} or built-in defaults");
    }
}
