pub mod config;
pub mod initialization;
pub mod logging_system;

pub use config::{Config, ConfigError, EndpointConfig, LogLevel};
pub use initialization::InitializationError;
pub use logging_system::{LoggingSystem, setup_logging};

use crate::output::Forwarder;
use anyhow::Context;
use serde_json::Value;
use std::process;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// Standalone host for the HTTP output: one JSON event record per line on
/// stdin, each forwarded to the collector.
pub struct App {
    config: Config,
    forwarder: Forwarder,
}

impl App {
    pub fn from_args<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args(args)?;
        setup_logging(config.log_level).context("failed to initialize logging")?;
        Self::from_config(config)
    }

    /// Loads the endpoint once; any problem here is fatal for the sink.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        info!("Starting cowrie-http-sink v{}", env!("CARGO_PKG_VERSION"));

        let endpoint = EndpointConfig::load(&config.config_file).with_context(|| {
            format!(
                "failed to load [{}] from {}",
                config::ENDPOINT_SECTION,
                config.config_file.display()
            )
        })?;
        let forwarder = Forwarder::new(endpoint, config.client_config())?;

        Ok(Self { config, forwarder })
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Forwards stdin until EOF or Ctrl+C, then drains in-flight deliveries.
    pub async fn run(self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());

        tokio::select! {
            result = self.pump(stdin) => {
                result.context("failed to read events from stdin")?;
                info!("Input closed");
            }
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Received SIGINT (Ctrl+C), stopping"),
                    Err(e) => error!("Failed to listen for SIGINT: {}", e),
                }
            }
        }

        self.forwarder.stop(self.config.shutdown_grace()).await;

        let stats = self.forwarder.stats();
        info!(
            "Delivered {}/{} events ({} reported errors, {} partial bodies, {} transport failures, avg {:?})",
            stats.succeeded,
            stats.submitted,
            stats.reported_errors,
            stats.partial_bodies,
            stats.transport_failures,
            stats.average_latency
        );
        Ok(())
    }

    /// Submits every non-blank line of `input`. Lines that are not JSON are
    /// skipped with a warning. Returns the number of submitted events.
    pub async fn pump<R>(&self, input: R) -> std::io::Result<u64>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut submitted = 0;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let event: Value = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Skipping input line that is not JSON: {}", e);
                    continue;
                }
            };

            match self.forwarder.submit(&event) {
                Ok(_) => submitted += 1,
                Err(e) => warn!("Dropping event: {}", e),
            }
        }

        Ok(submitted)
    }
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    match App::from_args(std::env::args_os()) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {:#}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Configuration error: {:#}", e);
            eprintln!("cowrie-http-sink: {e:#}");
            process::exit(1);
        }
    }

    Ok(())
}
