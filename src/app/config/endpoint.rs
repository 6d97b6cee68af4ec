use super::ConfigError;
use super::serde_helpers::{self, load_env_string_opt};
use reqwest::Method;
use serde::Deserialize;
use std::path::Path;

/// TOML table holding the HTTP output options.
pub const ENDPOINT_SECTION: &str = "output_http";

/// Resolved collector endpoint settings.
///
/// Every option must be present in the source, but all of them except `url`
/// may be empty. Empty values are stored as `None` and are left out of the
/// outbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub url: String,
    pub port: Option<String>,
    pub protocol: Option<String>,
    pub method: Method,
    /// Raw `name=value,name=value` custom header list.
    pub headers: Option<String>,
    pub sensor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    output_http: Option<RawEndpointSection>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEndpointSection {
    #[serde(default)]
    url: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::opt_string_or_number")]
    port: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    headers: Option<String>,
    #[serde(default)]
    sensor: Option<String>,
}

impl RawEndpointSection {
    fn apply_env_overrides(&mut self) {
        load_env_string_opt("OUTPUT_HTTP_URL", &mut self.url);
        load_env_string_opt("OUTPUT_HTTP_PORT", &mut self.port);
        load_env_string_opt("OUTPUT_HTTP_PROTOCOL", &mut self.protocol);
        load_env_string_opt("OUTPUT_HTTP_METHOD", &mut self.method);
        load_env_string_opt("OUTPUT_HTTP_HEADERS", &mut self.headers);
        load_env_string_opt("OUTPUT_HTTP_SENSOR", &mut self.sensor);
    }

    fn resolve(self) -> Result<EndpointConfig, ConfigError> {
        let url = require(self.url, "url")?.trim().to_string();
        let port = require(self.port, "port")?;
        let protocol = require(self.protocol, "protocol")?;
        let method = require(self.method, "method")?;
        let headers = require(self.headers, "headers")?;
        let sensor = require(self.sensor, "sensor")?;

        let config = EndpointConfig {
            url,
            port: non_empty(port),
            protocol: non_empty(protocol),
            method: canonical_method(&method)?,
            headers: non_empty(headers),
            sensor: non_empty(sensor),
        };
        config.validate()?;
        Ok(config)
    }
}

impl EndpointConfig {
    /// Endpoint with only a target URL; every other option is unset.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            port: None,
            protocol: None,
            method: Method::POST,
            headers: None,
            sensor: None,
        }
    }

    /// Parses the `[output_http]` table out of a TOML document.
    ///
    /// Other tables are ignored so the sink can share a file with the rest of
    /// the pipeline.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.output_http.unwrap_or_default().resolve()
    }

    /// Reads the file and lets `OUTPUT_HTTP_*` environment variables override
    /// or supply individual options.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        let mut section = file.output_http.unwrap_or_default();
        section.apply_env_overrides();
        section.resolve()
    }

    /// Builds the endpoint purely from `OUTPUT_HTTP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut section = RawEndpointSection::default();
        section.apply_env_overrides();
        section.resolve()
    }
}

/// Canonicalizes a configured method name; an empty value means `POST`.
pub fn canonical_method(raw: &str) -> Result<Method, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Method::POST);
    }

    Method::from_bytes(trimmed.to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(raw.to_string()))
}

fn require(value: Option<String>, key: &str) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingKey {
        section: ENDPOINT_SECTION.to_string(),
        key: key.to_string(),
    })
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
