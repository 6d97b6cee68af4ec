use cowrie_http_sink::EndpointConfig;
use cowrie_http_sink::app::ConfigError;
use reqwest::Method;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

const ENV_KEYS: [&str; 6] = [
    "OUTPUT_HTTP_URL",
    "OUTPUT_HTTP_PORT",
    "OUTPUT_HTTP_PROTOCOL",
    "OUTPUT_HTTP_METHOD",
    "OUTPUT_HTTP_HEADERS",
    "OUTPUT_HTTP_SENSOR",
];

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn clear_env() {
    for key in ENV_KEYS {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::remove_var(key) };
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: tests touching the environment are serialized.
    unsafe { std::env::set_var(key, value) };
}

#[test]
#[serial]
fn test_load_from_file() {
    clear_env();
    let file = write_config(
        r#"
[output_http]
url = "https://collector.example.com/api/v1/events"
port = "443"
protocol = "https"
method = "put"
headers = "Authorization=Bearer abc,X-Env=prod"
sensor = "edge-01"
"#,
    );

    let config = assert_ok!(EndpointConfig::load(file.path()));
    assert_eq!(config.url, "https://collector.example.com/api/v1/events");
    assert_eq!(config.method, Method::PUT);
    assert_eq!(config.sensor.as_deref(), Some("edge-01"));
}

#[test]
#[serial]
fn test_missing_key_is_fatal() {
    clear_env();
    let file = write_config(
        r#"
[output_http]
url = "https://collector.example.com/"
port = "443"
protocol = "https"
method = "post"
sensor = ""
"#,
    );

    let err = assert_err!(EndpointConfig::load(file.path()));
    assert!(matches!(err, ConfigError::MissingKey { ref key, .. } if key == "headers"));
    assert!(err.to_string().contains("headers"));
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let file = write_config(
        r#"
[output_http]
url = "https://collector.example.com/"
port = ""
protocol = ""
method = ""
headers = ""
sensor = "from-file"
"#,
    );

    set_env("OUTPUT_HTTP_SENSOR", "from-env");
    set_env("OUTPUT_HTTP_METHOD", "patch");
    let result = EndpointConfig::load(file.path());
    clear_env();

    let config = assert_ok!(result);
    assert_eq!(config.sensor.as_deref(), Some("from-env"));
    assert_eq!(config.method, Method::PATCH);
}

#[test]
#[serial]
fn test_env_can_supply_missing_keys() {
    clear_env();
    let file = write_config(
        r#"
[output_http]
url = "http://localhost:9000/ingest"
"#,
    );

    for key in &ENV_KEYS[1..] {
        set_env(key, "");
    }
    let result = EndpointConfig::load(file.path());
    clear_env();

    let config = assert_ok!(result);
    assert_eq!(config.method, Method::POST);
    assert_eq!(config.port, None);
}

#[test]
#[serial]
fn test_from_env_only() {
    clear_env();
    set_env("OUTPUT_HTTP_URL", "http://localhost:9000/ingest");
    for key in &ENV_KEYS[1..] {
        set_env(key, "");
    }
    let result = EndpointConfig::from_env();
    clear_env();

    assert_eq!(assert_ok!(result).url, "http://localhost:9000/ingest");
}

#[test]
#[serial]
fn test_invalid_url_and_file_errors() {
    clear_env();
    let file = write_config(
        r#"
[output_http]
url = "collector.example.com"
port = ""
protocol = ""
method = ""
headers = ""
sensor = ""
"#,
    );
    assert!(matches!(
        EndpointConfig::load(file.path()),
        Err(ConfigError::InvalidUrl(_))
    ));

    assert!(matches!(
        EndpointConfig::load("/nonexistent/cowrie.toml"),
        Err(ConfigError::FileError(_))
    ));

    let broken = write_config("[output_http\nurl = ");
    assert!(matches!(
        EndpointConfig::load(broken.path()),
        Err(ConfigError::ParseError(_))
    ));
}
