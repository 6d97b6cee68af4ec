use super::client::HttpClient;
use super::headers::HeaderSet;
use super::stats::{DeliverySnapshot, DeliveryStats};
use crate::app::config::EndpointConfig;
use crate::domain::{OutboundEvent, SinkError};
use bytes::{Bytes, BytesMut};
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, trace, warn};

/// Largest error body interpreted; anything past it is not read.
pub const MAX_REPORT_BODY: usize = 64 * 1024;

/// What the collector said in a non-200 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorReport {
    /// The `text` field of a JSON body.
    Text(String),
    /// Valid JSON without a `text` field.
    MissingText,
    /// The body was not JSON at all.
    InvalidJson(String),
}

impl CollectorReport {
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => match fields.get("text") {
                Some(Value::String(text)) => CollectorReport::Text(text.clone()),
                Some(other) => CollectorReport::Text(other.to_string()),
                None => CollectorReport::MissingText,
            },
            Ok(_) => CollectorReport::MissingText,
            Err(e) => CollectorReport::InvalidJson(e.to_string()),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            CollectorReport::Text(text) => Some(text),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            CollectorReport::Text(text) => warn!("HTTP response: {}", text),
            CollectorReport::MissingText => {
                warn!("HTTP response body has no 'text' field");
            }
            CollectorReport::InvalidJson(reason) => {
                warn!("HTTP response body is not valid JSON: {}", reason);
            }
        }
    }
}

/// Terminal state of one HTTP exchange.
///
/// Only ever logged and counted; nothing is retried and nothing is handed
/// back to the code that submitted the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Status 200; the body is ignored.
    Success { status: StatusCode },
    /// Any other status, with the fully read body interpreted.
    ReportedError {
        status: StatusCode,
        report: CollectorReport,
    },
    /// Any other status where the body read broke off part-way, typically
    /// because the server closed the connection before the declared length.
    /// The bytes that did arrive are interpreted like a full body.
    PartialBodyError {
        status: StatusCode,
        report: CollectorReport,
        cause: String,
    },
    /// No response at all: refused, DNS, TLS, timeout.
    TransportFailure { error: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Success { .. })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DeliveryOutcome::Success { status }
            | DeliveryOutcome::ReportedError { status, .. }
            | DeliveryOutcome::PartialBodyError { status, .. } => Some(*status),
            DeliveryOutcome::TransportFailure { .. } => None,
        }
    }

    pub fn report(&self) -> Option<&CollectorReport> {
        match self {
            DeliveryOutcome::ReportedError { report, .. }
            | DeliveryOutcome::PartialBodyError { report, .. } => Some(report),
            _ => None,
        }
    }
}

enum BodyRead {
    Complete(Bytes),
    Partial { received: Bytes, cause: reqwest::Error },
}

/// Executes deliveries against the collector and classifies the replies.
///
/// Everything inside is immutable or atomic, so clones are handed to each
/// spawned delivery.
#[derive(Debug, Clone)]
pub struct Transport {
    client: HttpClient,
    url: Arc<str>,
    method: Method,
    headers: Arc<HeaderSet>,
    stats: Arc<DeliveryStats>,
}

impl Transport {
    pub fn new(client: HttpClient, endpoint: &EndpointConfig) -> Self {
        let headers = HeaderSet::from_spec(endpoint.headers.as_deref());
        if !headers.rejected().is_empty() {
            warn!(
                "{} custom header entr{} ignored for {}",
                headers.rejected().len(),
                if headers.rejected().len() == 1 { "y" } else { "ies" },
                endpoint.url
            );
        }

        Self {
            client,
            url: Arc::from(endpoint.url.as_str()),
            method: endpoint.method.clone(),
            headers: Arc::new(headers),
            stats: Arc::new(DeliveryStats::new()),
        }
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn stats(&self) -> DeliverySnapshot {
        self.stats.snapshot()
    }

    /// Encodes the event and runs one exchange.
    ///
    /// Only encoding can fail; every network problem ends up in the outcome.
    pub async fn send(&self, event: &OutboundEvent) -> Result<DeliveryOutcome, SinkError> {
        let body = event.to_json_bytes()?;
        Ok(self.deliver(body).await)
    }

    pub async fn deliver(&self, body: Bytes) -> DeliveryOutcome {
        let start = Instant::now();
        self.stats.record_submitted(body.len());

        let request = self
            .client
            .inner()
            .request(self.method.clone(), &*self.url)
            .headers(self.headers.headers().clone())
            .body(body);

        let outcome = match request.send().await {
            Ok(response) => classify(response).await,
            Err(e) => {
                let chain = error_chain(&e);
                error!("HTTP delivery to {} failed: {}", self.url, chain);
                trace!(error = ?e, "transport failure detail");
                DeliveryOutcome::TransportFailure { error: chain }
            }
        };

        let latency = start.elapsed();
        debug!(
            "Delivery to {} finished in {:?}: {:?}",
            self.url,
            latency,
            outcome.status()
        );
        self.stats.record_outcome(&outcome, latency);
        outcome
    }
}

async fn classify(response: Response) -> DeliveryOutcome {
    let status = response.status();
    if status == StatusCode::OK {
        return DeliveryOutcome::Success { status };
    }

    warn!(
        "HTTP response: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );

    match read_body(response).await {
        BodyRead::Complete(body) => {
            let report = CollectorReport::from_body(&body);
            report.log();
            DeliveryOutcome::ReportedError { status, report }
        }
        BodyRead::Partial { received, cause } => {
            let cause = error_chain(&cause);
            debug!(
                "Response body cut short after {} bytes ({}), using what arrived",
                received.len(),
                cause
            );
            let report = CollectorReport::from_body(&received);
            report.log();
            DeliveryOutcome::PartialBodyError {
                status,
                report,
                cause,
            }
        }
    }
}

/// Reads the body chunk by chunk so that a broken-off read still yields the
/// bytes received before the failure. Stops at `MAX_REPORT_BODY`.
async fn read_body(mut response: Response) -> BodyRead {
    let mut received = BytesMut::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = MAX_REPORT_BODY - received.len();
                if chunk.len() >= room {
                    received.extend_from_slice(&chunk[..room]);
                    debug!(
                        "Response body reached {} bytes, ignoring the rest",
                        MAX_REPORT_BODY
                    );
                    return BodyRead::Complete(received.freeze());
                }
                received.extend_from_slice(&chunk);
            }
            Ok(None) => return BodyRead::Complete(received.freeze()),
            Err(cause) => {
                return BodyRead::Partial {
                    received: received.freeze(),
                    cause,
                };
            }
        }
    }
}

fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
