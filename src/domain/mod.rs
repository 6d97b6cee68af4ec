//! Domain layer for cowrie-http-sink.
//!
//! Contains the types shared across the forwarder and the transport:
//! - `EventRecord`: one honeypot log record as a JSON object
//! - `OutboundEvent`: the envelope sent to the collector
//! - `SinkError`: Top-level error type

pub mod error;
pub mod event;
pub mod outbound;

pub use error::SinkError;
pub use event::{EventRecord, LEGACY_KEY_PREFIX, strip_legacy_keys, to_event_record};
pub use outbound::OutboundEvent;
