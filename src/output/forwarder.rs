use crate::app::config::EndpointConfig;
use crate::domain::{OutboundEvent, SinkError, strip_legacy_keys, to_event_record};
use crate::sender::{ClientConfig, DeliveryOutcome, DeliverySnapshot, HttpClient, Transport};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, error, info, warn};

/// The HTTP output: turns each submitted record into one independent
/// delivery to the collector.
///
/// `submit` never waits on the network. Each delivery runs as its own task
/// on the runtime captured at construction, so a slow collector reply never
/// holds up later events and events may reach the collector out of order.
#[derive(Debug)]
pub struct Forwarder {
    endpoint: Arc<EndpointConfig>,
    transport: Transport,
    runtime: Handle,
    tracker: TaskTracker,
}

impl Forwarder {
    /// Builds the forwarder on the runtime of the calling context.
    pub fn new(endpoint: EndpointConfig, client_config: ClientConfig) -> Result<Self, SinkError> {
        let runtime = Handle::try_current().map_err(|e| SinkError::NoRuntime(e.to_string()))?;
        Self::with_runtime(endpoint, client_config, runtime)
    }

    pub fn with_runtime(
        endpoint: EndpointConfig,
        client_config: ClientConfig,
        runtime: Handle,
    ) -> Result<Self, SinkError> {
        endpoint.validate()?;
        let client = HttpClient::new(client_config)?;
        let transport = Transport::new(client, &endpoint);

        info!(
            "HTTP output ready: {} {} (sensor: {})",
            endpoint.method,
            endpoint.url,
            endpoint.sensor.as_deref().unwrap_or("from event")
        );

        Ok(Self {
            endpoint: Arc::new(endpoint),
            transport,
            runtime,
            tracker: TaskTracker::new(),
        })
    }

    /// Schedules delivery of one record and returns immediately.
    ///
    /// Fails only when the record cannot be turned into a JSON object or the
    /// forwarder has been stopped. The returned handle may be dropped; the
    /// delivery keeps running either way.
    pub fn submit<E>(&self, event: &E) -> Result<DeliveryHandle, SinkError>
    where
        E: Serialize + ?Sized,
    {
        if self.tracker.is_closed() {
            return Err(SinkError::Stopped);
        }

        let record = strip_legacy_keys(to_event_record(event)?);
        let body = OutboundEvent::build(&self.endpoint, record).to_json_bytes()?;

        let transport = self.transport.clone();
        let task = self.tracker.spawn_on(
            async move { transport.deliver(body).await }.in_current_span(),
            &self.runtime,
        );

        Ok(DeliveryHandle { task })
    }

    /// Stops accepting events and waits up to `grace` for in-flight
    /// deliveries. Returns `false` if some were still running.
    ///
    /// Running deliveries are never cancelled; they finish on their own or
    /// hit the client timeout.
    pub async fn stop(&self, grace: Duration) -> bool {
        self.tracker.close();

        let pending = self.tracker.len();
        if pending > 0 {
            info!("Waiting up to {:?} for {} in-flight deliveries", grace, pending);
        }

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            info!("HTTP output stopped");
            true
        } else {
            warn!(
                "HTTP output stopped with {} deliveries still in flight",
                self.tracker.len()
            );
            false
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn stats(&self) -> DeliverySnapshot {
        self.transport.stats()
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

/// Handle to one scheduled delivery, for callers that want to observe it.
#[derive(Debug)]
pub struct DeliveryHandle {
    task: JoinHandle<DeliveryOutcome>,
}

impl DeliveryHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the delivery. `None` only if the task itself panicked or
    /// was aborted by runtime shutdown.
    pub async fn outcome(self) -> Option<DeliveryOutcome> {
        match self.task.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Delivery task ended abnormally: {}", e);
                None
            }
        }
    }
}
