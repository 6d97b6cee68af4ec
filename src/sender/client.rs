use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use super::headers::SINK_USER_AGENT;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for one whole exchange, body included.
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_idle_connections: usize,
    pub keep_alive_timeout: Duration,
    /// Operator opt-in for collectors with self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            max_idle_connections: 10,
            keep_alive_timeout: Duration::from_secs(90),
            accept_invalid_certs: false,
        }
    }
}

/// The long-lived HTTP client shared by every delivery.
///
/// Cloning is cheap: the connection pool lives behind reqwest's own `Arc`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.timeout.is_zero() {
            return Err(ClientError::InvalidConfiguration(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        // rustls with the bundled web PKI roots, so HTTPS works against any
        // publicly trusted collector without a system OpenSSL.
        let mut client_builder = ClientBuilder::new()
            .use_rustls_tls()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(SINK_USER_AGENT);

        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for the collector connection");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            ClientError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_with_defaults() {
        let client = HttpClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(30));
        assert!(!client.config().accept_invalid_certs);
    }

    #[test]
    fn test_client_creation_accepting_invalid_certs() {
        let config = ClientConfig {
            accept_invalid_certs: true,
            ..Default::default()
        };
        assert!(HttpClient::new(config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            HttpClient::new(config),
            Err(ClientError::InvalidConfiguration(_))
        ));
    }
}
