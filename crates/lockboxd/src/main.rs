//! lockboxd: encrypted file store gateway
//!
//! Usage:
//!   lockboxd [--config /etc/lockbox/config.toml] [--verbose]
//!
//! On start the session-signing secret is provisioned once (env override,
//! persisted file, or freshly generated), then the HTTP server runs with the
//! credential gate in front of every file route.

mod daemon;
mod metrics;
mod routes;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lockboxd", version, about = "Lockbox encrypted file store gateway")]
struct Cli {
    /// Path to lockbox.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "LOCKBOX_CONFIG",
        default_value = "/etc/lockbox/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOCKBOX_LOG", default_value = "info")]
    log: String,

    /// Log format (json, text)
    #[arg(long, env = "LOCKBOX_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Log every gate decision (development/debug mode)
    #[arg(long, env = "LOCKBOX_VERBOSE")]
    verbose: bool,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, &cli.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "lockboxd starting"
    );

    let config = lockbox_core::config::LockboxConfig::load(&cli.config)
        .map_err(|e| anyhow::anyhow!("loading config {}: {e}", cli.config.display()))?;

    let verbose = cli.verbose || config.daemon.verbose;
    daemon::run(config, verbose).await
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
