//! Connection registry
//!
//! The in-memory set of currently open connections. Broadcasts take a snapshot via
//! [`ConnectionRegistry::list`] so concurrent connects and disconnects never see a
//! half-updated map.

use crate::types::{Connection, ConnectionId, ConnectionState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    DuplicateKey(ConnectionId),
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and mark it open
    pub async fn add(&self, mut connection: Connection) -> Result<(), RegistryError> {
        let mut connections = self.connections.write().await;

        if connections.contains_key(&connection.id) {
            return Err(RegistryError::DuplicateKey(connection.id));
        }

        // A connection that already closed must never be tracked
        if connection.transition(ConnectionState::Open).is_err() {
            tracing::debug!("Refusing to register closed connection {}", connection.id);
            return Ok(());
        }

        connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    /// Remove a connection. Absent IDs are a no-op since disconnects can race.
    pub async fn remove(&self, id: &str) -> Option<Connection> {
        let mut connection = self.connections.write().await.remove(id)?;
        let _ = connection.transition(ConnectionState::Closed);
        Some(connection)
    }

    /// Snapshot of the current connections, in no particular order
    pub async fn list(&self) -> Vec<Connection> {
        self.connections.read().await.values().cloned().collect()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.connections.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Close and drop every connection. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut connections = self.connections.write().await;
        let count = connections.len();
        connections.clear();
        count
    }
}
