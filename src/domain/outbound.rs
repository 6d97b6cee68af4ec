use super::{EventRecord, SinkError};
use crate::app::config::EndpointConfig;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

/// The JSON envelope posted to the collector for a single event.
///
/// Endpoint metadata is only included when the matching config value is set.
/// `sensor` prefers the configured name and falls back to the one carried by
/// the record itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<Value>,
    pub method: String,
    pub event: EventRecord,
}

impl OutboundEvent {
    /// Builds the envelope from an already cleaned record.
    pub fn build(endpoint: &EndpointConfig, event: EventRecord) -> Self {
        let sensor = match &endpoint.sensor {
            Some(sensor) => Some(Value::String(sensor.clone())),
            None => event.get("sensor").filter(|v| !v.is_null()).cloned(),
        };

        Self {
            url: non_empty(&endpoint.url),
            port: endpoint.port.clone(),
            protocol: endpoint.protocol.clone(),
            headers: endpoint.headers.clone(),
            sensor,
            method: endpoint.method.as_str().to_string(),
            event,
        }
    }

    pub fn to_json_bytes(&self) -> Result<Bytes, SinkError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::to_event_record;
    use reqwest::Method;
    use serde_json::json;

    fn endpoint() -> EndpointConfig {
        EndpointConfig {
            url: "https://collector.example.com/events".to_string(),
            port: Some("443".to_string()),
            protocol: Some("https".to_string()),
            method: Method::POST,
            headers: None,
            sensor: None,
        }
    }

    fn record(value: Value) -> EventRecord {
        to_event_record(&value).unwrap()
    }

    #[test]
    fn test_build_includes_only_configured_metadata() {
        let outbound = OutboundEvent::build(&endpoint(), record(json!({"eventid": "x"})));
        let wire = serde_json::to_value(&outbound).unwrap();

        assert_eq!(wire["url"], "https://collector.example.com/events");
        assert_eq!(wire["port"], "443");
        assert_eq!(wire["protocol"], "https");
        assert_eq!(wire["method"], "POST");
        assert!(wire.get("headers").is_none());
        assert!(wire.get("sensor").is_none());
        assert_eq!(wire["event"]["eventid"], "x");
    }

    #[test]
    fn test_configured_sensor_wins_over_event_sensor() {
        let mut config = endpoint();
        config.sensor = Some("edge-01".to_string());

        let outbound =
            OutboundEvent::build(&config, record(json!({"sensor": "from-event"})));
        assert_eq!(outbound.sensor, Some(json!("edge-01")));
        // The record itself keeps its own value.
        assert_eq!(outbound.event["sensor"], "from-event");
    }

    #[test]
    fn test_event_sensor_used_when_not_configured() {
        let outbound = OutboundEvent::build(&endpoint(), record(json!({"sensor": "hp-7"})));
        assert_eq!(outbound.sensor, Some(json!("hp-7")));
    }

    #[test]
    fn test_sensor_omitted_when_absent_everywhere() {
        let outbound = OutboundEvent::build(&endpoint(), record(json!({"sensor": null})));
        assert_eq!(outbound.sensor, None);
    }

    #[test]
    fn test_method_is_serialized_in_canonical_form() {
        let mut config = endpoint();
        config.method = Method::PUT;

        let outbound = OutboundEvent::build(&config, EventRecord::new());
        let bytes = outbound.to_json_bytes().unwrap();
        let wire: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(wire["method"], "PUT");
    }
}
