//! # joy-teleop
//!
//! Reads joystick frames, ramps them into velocity commands and writes the
//! commands to standard output as JSON Lines.
//!
//! # Usage
//!
//! ```bash
//! joy-teleop [CONFIG_PATH]
//! ```
//!
//! Without an argument `config/default.toml` is used if present, otherwise
//! the built-in defaults. Logs go to stderr (and optionally to daily files),
//! so stdout carries nothing but commands. `RUST_LOG` overrides the
//! configured level.
//!
//! Expected output:
//! ```text
//! INFO joy_teleop: joy-teleop v0.1.0 starting...
//! INFO joy_teleop: Reading JSON Lines frames from stdin
//! INFO joy_teleop::teleop::ramper: Max speed raised to 0.525
//! ```

use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use joy_teleop::config::{Config, InputSource, LoggingConfig};
use joy_teleop::sink::jsonl::JsonlCommandSink;
use joy_teleop::source::joystick::EvdevJoystick;
use joy_teleop::source::jsonl::JsonlFrameSource;
use joy_teleop::source::FrameSource;
use joy_teleop::teleop::mapper::JoystickFrameMapper;
use joy_teleop::teleop::node::TeleopNode;
use joy_teleop::teleop::ramper::VelocityRamper;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for daily log files
const LOG_FILE_PREFIX: &str = "joy-teleop.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _guard = init_logging(&config.logging);

    info!("joy-teleop v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut source: Box<dyn FrameSource> = match config.input.source {
        InputSource::Stdin => {
            info!("Reading JSON Lines frames from stdin");
            Box::new(JsonlFrameSource::stdin())
        }
        InputSource::Evdev => {
            let joystick =
                EvdevJoystick::open(&config.input).context("Failed to open joystick")?;
            info!("Reading joystick {}", joystick.device_path());
            Box::new(joystick)
        }
    };
    let mut sink = JsonlCommandSink::stdout();

    let mapper = JoystickFrameMapper::with_deadzone(config.input.deadzone());
    let ramper = VelocityRamper::with_params(config.ramp.params());
    let mut node = TeleopNode::new(mapper, ramper);

    info!("Max speed {:.3}, press Ctrl+C to exit", node.ramper().max_speed());

    let stats = node
        .run(
            source.as_mut(),
            &mut sink,
            shutdown_signal(tokio::signal::ctrl_c()),
        )
        .await?;

    info!(
        "Published {} commands, skipped {} frames",
        stats.published, stats.skipped
    );

    Ok(())
}

/// Resolves when `signal` fires. A listener that fails never resolves, so the
/// node keeps running instead of stopping at startup.
async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Loads the config named on the command line, the default file, or defaults.
fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => {
            Config::load(&path).with_context(|| format!("Failed to load config from {}", path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Installs the stderr logger and, if configured, a daily file logger.
///
/// The returned guard must be held until exit so buffered file logs flush.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if config.log_dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = Config::load(path).unwrap();
        assert_eq!(config.ramp.params(), Config::default().ramp.params());
    }

    #[tokio::test]
    async fn test_shutdown_signal_fires() {
        let done = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            shutdown_signal(async { Ok(()) }),
        )
        .await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn test_failed_signal_listener_keeps_running() {
        let failing = async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal handler")) };
        let done = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            shutdown_signal(failing),
        )
        .await;
        assert!(done.is_err());
    }
}
