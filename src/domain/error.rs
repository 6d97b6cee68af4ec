use crate::app::config::ConfigError;
use crate::sender::ClientError;
use thiserror::Error;

/// Top-level error type for the HTTP sink.
///
/// Network failures never show up here: they are classified into a
/// `DeliveryOutcome` inside the spawned delivery and only logged.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] ClientError),

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Event record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("Forwarder is stopped")]
    Stopped,
}
