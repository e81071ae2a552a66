mod config;
mod driver;
mod logging;
mod ports;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use engage_video_session_core::{SilentStopPolicy, StateMachine};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

use crate::config::{CliConfig, ConfigOverrides};
use crate::logging::{parse_log_level, setup_logging, LoggingConfig};
use crate::ports::LoggingPorts;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SilentStop {
    Ignore,
    EndLocally,
}

impl From<SilentStop> for SilentStopPolicy {
    fn from(value: SilentStop) -> Self {
        match value {
            SilentStop::Ignore => SilentStopPolicy::Ignore,
            SilentStop::EndLocally => SilentStopPolicy::EndLocally,
        }
    }
}

/// Drive a video session state machine from a JSON-lines signal script
#[derive(Debug, Parser)]
#[command(name = "engage-video", version, about)]
struct Args {
    /// Signal script; reads stdin when omitted
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "ENGAGE_VIDEO_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "ENGAGE_VIDEO_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Include source file and line in log records
    #[arg(long)]
    file_info: bool,

    /// Log span timings for each signal
    #[arg(long)]
    spans: bool,

    /// Latency added to every asynchronous port call
    #[arg(long)]
    port_delay_ms: Option<u64>,

    /// Make a port fail every call (repeatable)
    #[arg(long = "fail-port", value_name = "PORT")]
    fail_ports: Vec<String>,

    /// Handling of STOP_SESSION_REQUEST{sendMessage:false} during an active session
    #[arg(long, value_enum)]
    silent_stop: Option<SilentStop>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = parse_log_level(&args.log_level)?;
    setup_logging(
        &LoggingConfig::new(level)
            .with_json(args.json_logs)
            .with_file_info(args.file_info)
            .with_spans(args.spans),
    )?;

    let config = CliConfig::resolve(
        args.config.as_deref(),
        ConfigOverrides {
            port_delay_ms: args.port_delay_ms,
            fail_ports: args.fail_ports.clone(),
            silent_stop: args.silent_stop.map(Into::into),
        },
    )?;

    let ports = Arc::new(LoggingPorts::new(&config.ports));
    let machine = StateMachine::with_config(ports, config.session.clone())
        .context("creating state machine")?;
    info!("Starting {} v{} as {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), machine.machine_id());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            driver::run(&machine, BufReader::new(file), &mut out).await?
        }
        None => driver::run(&machine, BufReader::new(tokio::io::stdin()), &mut out).await?,
    };

    info!(
        "Processed {} signals: {} applied, {} failed, final state {}",
        summary.signals, summary.applied, summary.failed, summary.final_state
    );
    Ok(())
}
