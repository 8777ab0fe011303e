use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use powermon_lib::{Reading, Sensor, Session, SessionConfig};

/// Query a PZEM-004T style power monitor over a serial line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial device the meter is attached to (e.g. /dev/ttyUSB0).
    device: String,
    /// What to read: test, voltage, current, power or energy.
    mode: String,
    /// Milliseconds to wait for the meter to answer.
    #[arg(short, long, default_value_t = 1000)]
    timeout_ms: u64,
    /// Print the reading as a JSON object instead of a bare number.
    #[arg(long)]
    json: bool,
    /// Optional path to a file to write logs to, in addition to stderr.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

fn setup_logging(log_file_path: Option<&PathBuf>, verbosity: &Verbosity<WarnLevel>) -> Result<Option<WorkerGuard>> {
    // stdout carries the reading only
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = if let Some(path) = log_file_path {
        let log_file =
            File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Format a reading for stdout
fn render(reading: &Reading, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string(reading).context("Failed to serialize reading");
    }
    Ok(reading.to_string())
}

async fn run(cli: &Cli) -> Result<String> {
    let sensor: Sensor = cli.mode.parse()?;
    let config = SessionConfig::default().with_timeout(Duration::from_millis(cli.timeout_ms));
    debug!(?config, %sensor, "Starting query");

    let mut session =
        Session::open(&cli.device, config).with_context(|| format!("Failed to open {}", cli.device))?;
    report(&mut session, sensor, cli.json).await
}

/// One exchange on an open session, rendered for stdout
async fn report<S>(session: &mut Session<S>, sensor: Sensor, json: bool) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reading = session.read(sensor).await?;
    info!(%sensor, value = reading.value, unit = reading.unit, "Reading complete");
    render(&reading, json)
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            print!("{e}");
            process::exit(0);
        }
        Err(e) => {
            print!("{e}");
            process::exit(1);
        }
    };

    let guard = match setup_logging(cli.log_file.as_ref(), &cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            println!("{e:#}");
            process::exit(1);
        }
    };

    match run(&cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            println!("{e:#}");
            // Exit explicitly; drop the guard first so file logs are flushed
            drop(guard);
            process::exit(1);
        }
    }
}
