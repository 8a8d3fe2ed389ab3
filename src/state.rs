use crate::broadcast::{self, BroadcastEngine, DispatchError, Dispatcher};
use crate::config::ServerConfig;
use crate::registry::{ConnectionRegistry, RegistryError};
use crate::types::*;
use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;

/// Shared application state, owned by the server for its whole lifetime
#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    dispatcher: Dispatcher,
    outbound_capacity: usize,
}

/// A registered connection as seen by its own session task
pub struct Session {
    pub id: ConnectionId,
    /// Frames the broadcast engine queued for this connection
    pub outbound: mpsc::Receiver<Utf8Bytes>,
}

impl AppState {
    /// Build the state together with the engine that must be spawned to drain it
    pub fn new(config: &ServerConfig) -> (Self, BroadcastEngine) {
        let registry = ConnectionRegistry::new();
        let (dispatcher, engine) = broadcast::channel(registry.clone(), config.dispatch_capacity);
        let state = Self {
            registry,
            dispatcher,
            outbound_capacity: config.outbound_capacity,
        };
        (state, engine)
    }

    /// Register a new connection under a fresh ID
    pub async fn open_session(&self) -> Result<Session, RegistryError> {
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        let connection = Connection::new(new_connection_id(), tx);
        let id = connection.id.clone();

        self.registry.add(connection).await?;
        tracing::debug!("Connection {} open ({} total)", id, self.registry.len().await);

        Ok(Session { id, outbound: rx })
    }

    pub async fn close_session(&self, id: &str) {
        if self.registry.remove(id).await.is_some() {
            tracing::debug!("Connection {} closed ({} total)", id, self.registry.len().await);
        }
    }

    /// Hand an inbound chat message to the broadcast engine
    pub async fn submit_message(&self, sender: &str, payload: String) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(InboundEvent {
                sender: sender.to_string(),
                payload,
            })
            .await
    }

    /// Drop every connection; their session tasks see the outbound queue close
    pub async fn shutdown(&self) {
        let closed = self.registry.clear().await;
        tracing::info!("Closed {} connection(s) on shutdown", closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_and_close_session() {
        let (state, _engine) = AppState::new(&ServerConfig::default());

        let session = state.open_session().await.unwrap();
        assert!(state.registry.contains(&session.id).await);

        state.close_session(&session.id).await;
        assert!(state.registry.is_empty().await);

        // Closing twice is harmless
        state.close_session(&session.id).await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_outbound_queues() {
        let (state, _engine) = AppState::new(&ServerConfig::default());
        let mut session = state.open_session().await.unwrap();

        state.shutdown().await;

        assert!(state.registry.is_empty().await);
        assert!(session.outbound.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_submit_without_engine_fails() {
        let (state, engine) = AppState::new(&ServerConfig::default());
        drop(engine);

        assert_eq!(
            state.submit_message("a", "hi".to_string()).await,
            Err(DispatchError::EngineStopped)
        );
    }
}
