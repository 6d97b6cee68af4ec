// Lock-free delivery statistics using atomic operations
//
// Shared by every spawned delivery; no delivery ever waits on another to
// record its outcome.

use super::transmission::DeliveryOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct DeliveryStats {
    submitted: AtomicU64,
    succeeded: AtomicU64,
    reported_errors: AtomicU64,
    partial_bodies: AtomicU64,
    transport_failures: AtomicU64,
    bytes_sent: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an event handed to the transport.
    pub fn record_submitted(&self, bytes: usize) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Counts the terminal state of one exchange.
    pub fn record_outcome(&self, outcome: &DeliveryOutcome, latency: Duration) {
        let counter = match outcome {
            DeliveryOutcome::Success { .. } => &self.succeeded,
            DeliveryOutcome::ReportedError { .. } => &self.reported_errors,
            DeliveryOutcome::PartialBodyError { .. } => &self.partial_bodies,
            DeliveryOutcome::TransportFailure { .. } => &self.transport_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let reported_errors = self.reported_errors.load(Ordering::Relaxed);
        let partial_bodies = self.partial_bodies.load(Ordering::Relaxed);
        let transport_failures = self.transport_failures.load(Ordering::Relaxed);
        let completed = succeeded + reported_errors + partial_bodies + transport_failures;

        let average_latency = if completed > 0 {
            Duration::from_millis(self.total_latency_ms.load(Ordering::Relaxed) / completed)
        } else {
            Duration::ZERO
        };

        DeliverySnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            succeeded,
            reported_errors,
            partial_bodies,
            transport_failures,
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            average_latency,
        }
    }
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySnapshot {
    pub submitted: u64,
    pub succeeded: u64,
    pub reported_errors: u64,
    pub partial_bodies: u64,
    pub transport_failures: u64,
    pub bytes_sent: u64,
    pub average_latency: Duration,
}

impl DeliverySnapshot {
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed()
    }

    pub fn failed(&self) -> u64 {
        self.reported_errors + self.partial_bodies + self.transport_failures
    }
}
