use super::{ConfigError, LogLevel};
use crate::sender::ClientConfig;
use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

/// Process-level options for the `cowrie-http-sink` binary.
///
/// Collector settings live in the `[output_http]` table of the config file;
/// these flags only tune the process and the shared HTTP client.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Configuration file holding the [output_http] table
    #[arg(long, short = 'c', env = "COWRIE_CONFIG", default_value = "etc/cowrie.toml")]
    pub config_file: PathBuf,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Total time budget for one delivery, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout, in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout_secs: u64,

    /// Idle pooled connections kept per collector host
    #[arg(long, env = "MAX_IDLE_CONNECTIONS", default_value = "10")]
    pub max_idle_connections: usize,

    /// Skip TLS certificate verification for the collector
    #[arg(long, env = "ACCEPT_INVALID_CERTS")]
    pub accept_invalid_certs: bool,

    /// How long to wait for in-flight deliveries on shutdown, in seconds
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value = "5")]
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("etc/cowrie.toml"),
            log_level: LogLevel::Info,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_idle_connections: 10,
            accept_invalid_certs: false,
            shutdown_grace_secs: 5,
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = match Config::try_parse_from(args) {
            Ok(config) => config,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => return Err(ConfigError::InvalidConfig(e.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.request_timeout_secs),
            connection_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_idle_connections: self.max_idle_connections,
            accept_invalid_certs: self.accept_invalid_certs,
            ..ClientConfig::default()
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
