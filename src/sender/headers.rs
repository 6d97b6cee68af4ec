use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use thiserror::Error;
use tracing::warn;

pub const SINK_USER_AGENT: &str = "Cowrie SSH Honeypot";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A single custom header entry that could not be attached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderSpecError {
    #[error("Header entry '{entry}' has no '=' delimiter")]
    MissingDelimiter { entry: String },
    #[error("Header entry '{entry}' has an empty name")]
    EmptyName { entry: String },
    #[error("Invalid header name '{name}'")]
    InvalidName { name: String },
    #[error("Invalid value for header '{name}'")]
    InvalidValue { name: String },
    #[error("Header '{name}' is fixed and cannot be overridden")]
    Reserved { name: String },
}

/// Request headers for every delivery: the fixed defaults plus whatever the
/// `headers` option lists.
///
/// Built once per transport. Bad entries are collected in `rejected` and
/// never affect the entries around them. `User-Agent` and `Content-Type` are
/// always the fixed defaults.
#[derive(Debug, Clone)]
pub struct HeaderSet {
    headers: HeaderMap,
    rejected: Vec<HeaderSpecError>,
}

impl HeaderSet {
    pub fn from_spec(spec: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(SINK_USER_AGENT));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut rejected = Vec::new();

        for entry in spec.unwrap_or_default().split(',') {
            if entry.trim().is_empty() {
                continue;
            }

            match parse_entry(entry) {
                // Repeated names add values.
                Ok((name, value)) => {
                    headers.append(name, value);
                }
                Err(e) => {
                    warn!("Skipping custom header: {}", e);
                    rejected.push(e);
                }
            }
        }

        Self { headers, rejected }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn rejected(&self) -> &[HeaderSpecError] {
        &self.rejected
    }

    /// All values sent for `name`, in insertion order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }
}

fn parse_entry(entry: &str) -> Result<(HeaderName, HeaderValue), HeaderSpecError> {
    let (name, value) = entry
        .split_once('=')
        .ok_or_else(|| HeaderSpecError::MissingDelimiter {
            entry: entry.trim().to_string(),
        })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(HeaderSpecError::EmptyName {
            entry: entry.trim().to_string(),
        });
    }

    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| HeaderSpecError::InvalidName {
            name: name.to_string(),
        })?;
    if header_name == USER_AGENT || header_name == CONTENT_TYPE {
        return Err(HeaderSpecError::Reserved {
            name: header_name.as_str().to_string(),
        });
    }

    let header_value =
        HeaderValue::from_str(value.trim()).map_err(|_| HeaderSpecError::InvalidValue {
            name: name.to_string(),
        })?;

    Ok((header_name, header_value))
}
