pub mod client;
pub mod headers;
pub mod stats;
pub mod transmission;

pub use client::{ClientConfig, ClientError, HttpClient};
pub use headers::{HeaderSet, HeaderSpecError, JSON_CONTENT_TYPE, SINK_USER_AGENT};
pub use stats::{DeliverySnapshot, DeliveryStats};
pub use transmission::{CollectorReport, DeliveryOutcome, Transport};
