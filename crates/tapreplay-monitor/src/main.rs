//! tapreplay: entry point.
//!
//! Watches an Android touchscreen through `adb shell getevent -l` and replays
//! each detected tap through `adb shell input tap`, either as a burst when the
//! finger lifts or periodically while it is held.
//!
//! # Usage
//!
//! ```text
//! tapreplay [OPTIONS]
//!
//! Options:
//!   --config <PATH>      Config file [default: platform config dir]
//!   --device <NODE>      Input device node, e.g. /dev/input/event3
//!   --serial <SERIAL>    adb device serial
//!   --policy <POLICY>    burst | hold
//!   --dry-run            Log taps instead of injecting them
//!   --print-config       Print the effective configuration and exit
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable            | Description                         |
//! |---------------------|-------------------------------------|
//! | `TAPREPLAY_CONFIG`  | Config file path                    |
//! | `TAPREPLAY_DEVICE`  | Input device node                   |
//! | `TAPREPLAY_SERIAL`  | adb device serial                   |
//! | `TAPREPLAY_POLICY`  | Replay policy                       |
//! | `RUST_LOG`          | Log filter, overrides `[logging]`   |
//!
//! CLI args take precedence over environment variables, which take precedence
//! over the config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tapreplay_core::GestureTracker;
use tapreplay_monitor::application::monitor::{PumpOutcome, StreamPump};
use tapreplay_monitor::application::replay_taps::{ReplayDriver, TapSink};
use tapreplay_monitor::infrastructure::event_source::EventSource;
use tapreplay_monitor::infrastructure::storage::config::{
    load_config, load_config_from, render_config, AppConfig, PolicyKind,
};
use tapreplay_monitor::infrastructure::tap_injection::{adb::AdbTapSink, dry_run::DryRunTapSink};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Touchscreen tap replay over adb.
#[derive(Debug, Parser)]
#[command(
    name = "tapreplay",
    about = "Replays touchscreen taps on an Android device through adb",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// When omitted, the platform config directory is used and a missing file
    /// means built-in defaults.
    #[arg(long, env = "TAPREPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Input device node passed to `getevent`.
    #[arg(long, env = "TAPREPLAY_DEVICE")]
    device: Option<String>,

    /// adb device serial, for when more than one device is attached.
    #[arg(long, env = "TAPREPLAY_SERIAL")]
    serial: Option<String>,

    /// Replay policy.
    #[arg(long, value_enum, env = "TAPREPLAY_POLICY")]
    policy: Option<PolicyKind>,

    /// Log the taps that would be injected without running `input tap`.
    #[arg(long)]
    dry_run: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Loads the config file named by `--config`, or the default one.
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("loading config from {}", path.display())),
            None => load_config().context("loading default config"),
        }
    }

    /// Applies command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(device) = &self.device {
            config.source.device = device.clone();
        }
        if let Some(serial) = &self.serial {
            config.source.serial = Some(serial.clone());
        }
        if let Some(policy) = self.policy {
            config.replay.policy = policy;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments are parsed and the config file is loaded and overridden.
/// 2. `tracing_subscriber` is initialised from `RUST_LOG`, falling back to
///    the configured `[logging] level`.
/// 3. The config is validated into a screen geometry, a replay policy, and
///    the event source command.
/// 4. The event source is spawned and its stdout handed to the stream pump.
/// 5. The pump runs until the stream ends or Ctrl+C is pressed; then the
///    child is stopped and its stderr and exit status are reported.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = cli.load_config()?;
    cli.apply_overrides(&mut config);

    if cli.print_config {
        print!("{}", render_config(&config)?);
        return Ok(());
    }

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    // ── Validate ──────────────────────────────────────────────────────────────
    let geometry = config.screen.geometry()?;
    let policy = config.replay.policy()?;
    let command = config.source.event_command()?;

    let sink: Arc<dyn TapSink> = if cli.dry_run {
        Arc::new(DryRunTapSink::new())
    } else {
        Arc::new(AdbTapSink::new(
            config.source.adb_path.clone(),
            config.source.serial.clone(),
        ))
    };

    info!(
        policy = policy.name(),
        dry_run = cli.dry_run,
        "tapreplay starting: screen {}x{}, raw max {}",
        geometry.screen_width(),
        geometry.screen_height(),
        geometry.raw_max()
    );

    // ── Event source ──────────────────────────────────────────────────────────
    let mut source = EventSource::spawn(&command)
        .with_context(|| format!("starting event source `{command}`"))?;
    let stdout = source.take_stdout()?;

    // ── Read loop ─────────────────────────────────────────────────────────────
    let tracker = GestureTracker::new(geometry, policy).with_sample_scope(config.replay.sample_scope);
    let driver = ReplayDriver::new(sink, policy).with_max_in_flight(config.replay.max_in_flight);
    let mut pump = StreamPump::new(tracker, config.source.dialect, driver);

    let outcome = pump.run(stdout, interrupt()).await;

    if !matches!(outcome, PumpOutcome::EndOfStream) {
        source.terminate().await?;
    }
    let report = source.finish().await?;

    for line in report.stderr.lines().filter(|l| !l.trim().is_empty()) {
        warn!("event source: {line}");
    }

    match outcome {
        PumpOutcome::EndOfStream => {
            if report.status.success() {
                info!("event source exited cleanly");
            } else {
                error!("event source exited with {}", report.status);
            }
        }
        PumpOutcome::Interrupted => info!("tapreplay stopped"),
        PumpOutcome::ReadFailed(e) => {
            return Err(anyhow::Error::new(e).context("reading the event stream"));
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C.  If the signal handler cannot be installed, never
/// resolves, and the monitor runs until the stream ends.
async fn interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => {
            error!("failed to listen for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
