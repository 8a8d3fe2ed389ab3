use crate::protocol::ChatEvent;
use crate::registry::ConnectionRegistry;
use crate::types::{DeliveryError, InboundEvent};
use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("broadcast engine has stopped")]
    EngineStopped,
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub dropped: usize,
}

/// Sending half of the single dispatch queue feeding the engine
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<InboundEvent>,
}

impl Dispatcher {
    pub async fn dispatch(&self, event: InboundEvent) -> Result<(), DispatchError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| DispatchError::EngineStopped)
    }
}

/// Create a dispatch queue and the engine that drains it
pub fn channel(registry: ConnectionRegistry, capacity: usize) -> (Dispatcher, BroadcastEngine) {
    let (tx, rx) = mpsc::channel(capacity);
    (Dispatcher { tx }, BroadcastEngine { registry, rx })
}

pub struct BroadcastEngine {
    registry: ConnectionRegistry,
    rx: mpsc::Receiver<InboundEvent>,
}

impl BroadcastEngine {
    /// Drain the dispatch queue until every `Dispatcher` is dropped
    pub async fn run(mut self) {
        tracing::debug!("Broadcast engine started");
        while let Some(event) = self.rx.recv().await {
            on_message(&self.registry, &event.sender, event.payload).await;
        }
        tracing::debug!("Broadcast engine stopped");
    }
}

/// Spawn the engine onto the runtime
pub fn spawn_engine(engine: BroadcastEngine) -> tokio::task::JoinHandle<()> {
    tokio::spawn(engine.run())
}

/// Deliver `payload` to every open connection, the sender included.
///
/// Each recipient is handled independently; a closed or backed-up queue is skipped
/// and never affects the others.
pub async fn on_message(
    registry: &ConnectionRegistry,
    sender: &str,
    payload: String,
) -> Delivery {
    tracing::info!("message: {}", payload);

    let frame = match serde_json::to_string(&ChatEvent::ChatMessage(payload)) {
        Ok(json) => Utf8Bytes::from(json),
        Err(e) => {
            tracing::error!("Failed to serialize chat message from {}: {}", sender, e);
            return Delivery::default();
        }
    };

    let mut delivery = Delivery::default();
    for connection in registry.list().await {
        match connection.try_deliver(frame.clone()) {
            Ok(()) => delivery.delivered += 1,
            Err(DeliveryError::Full) => {
                tracing::warn!("Outbound queue full for {}, dropping message", connection.id);
                delivery.dropped += 1;
            }
            Err(e) => {
                // Disconnect raced the broadcast
                tracing::debug!("Skipping {}: {}", connection.id, e);
                delivery.dropped += 1;
            }
        }
    }

    tracing::debug!(
        "Broadcast from {}: delivered={}, dropped={}",
        sender,
        delivery.delivered,
        delivery.dropped
    );
    delivery
}
