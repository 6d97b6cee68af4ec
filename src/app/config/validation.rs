use super::{Config, ConfigError, EndpointConfig};
use url::Url;

impl EndpointConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidUrl(
                "Collector URL must not be empty".to_string(),
            ));
        }

        let url = Url::parse(&self.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid collector URL '{}': {}", self.url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Unsupported scheme '{}' in collector URL '{}'",
                url.scheme(),
                self.url
            )));
        }

        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs > self.request_timeout_secs {
            return Err(ConfigError::InvalidConfig(format!(
                "Connection timeout ({}s) must not exceed request timeout ({}s)",
                self.connect_timeout_secs, self.request_timeout_secs
            )));
        }

        Ok(())
    }
}
