use super::SinkError;
use serde::Serialize;
use serde_json::{Map, Value};

/// One structured log record produced by the honeypot.
pub type EventRecord = Map<String, Value>;

/// Keys carrying this prefix come from an older record shape and are never forwarded.
pub const LEGACY_KEY_PREFIX: &str = "log_";

/// Converts any serializable event into an owned record.
///
/// The caller's value is only borrowed, so later cleanup never touches it.
pub fn to_event_record<E>(event: &E) -> Result<EventRecord, SinkError>
where
    E: Serialize + ?Sized,
{
    match serde_json::to_value(event)? {
        Value::Object(record) => Ok(record),
        other => Err(SinkError::NotAnObject(json_kind(&other))),
    }
}

/// Drops every key that starts with [`LEGACY_KEY_PREFIX`].
pub fn strip_legacy_keys(mut record: EventRecord) -> EventRecord {
    record.retain(|key, _| !key.starts_with(LEGACY_KEY_PREFIX));
    record
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
