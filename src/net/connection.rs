//! Connection lifecycle management.
//!
//! # Responsibilities
//! - Assign connection ids and own the per-connection outbound queue
//! - Track liveness between heartbeat probes
//! - Remove dead connections and their subscriptions
//!
//! Connections live in a map keyed by id; nothing ever scans them to resolve
//! identity. The socket task holds a [`Session`] and forwards whatever arrives
//! on its queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

use crate::distribution::registry::SubscriptionRegistry;
use crate::observability::metrics;

/// Frames queued per connection before it is treated as too slow to keep.
const SEND_BUFFER: usize = 256;

/// Unique identifier for a subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A frame for the socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Ping,
    Close,
}

#[derive(Debug, Error)]
#[error("connection limit of {0} reached")]
pub struct ConnectionLimitReached(pub usize);

struct ConnectionHandle {
    tx: mpsc::Sender<Outbound>,
    alive: AtomicBool,
    /// Socket connections answer pings; event streams cannot and are skipped.
    probed: bool,
    closed: Arc<Notify>,
}

/// The socket side of a registered connection.
pub struct Session {
    pub id: ConnectionId,
    pub outbound: mpsc::Receiver<Outbound>,
    /// Notified when the manager force-closes the connection.
    pub closed: Arc<Notify>,
}

pub struct ConnectionManager {
    connections: DashMap<ConnectionId, ConnectionHandle>,
    registry: Arc<SubscriptionRegistry>,
    max_connections: usize,
}

impl ConnectionManager {
    pub fn new(registry: Arc<SubscriptionRegistry>, max_connections: usize) -> Self {
        Self {
            connections: DashMap::new(),
            registry,
            max_connections,
        }
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Admit a new socket connection with an empty filter set.
    pub fn register(&self) -> Result<Session, ConnectionLimitReached> {
        self.admit(true)
    }

    /// Admit a one-way event stream. It counts against the limit but is never
    /// probed; it ends when the client goes away.
    pub fn register_stream(&self) -> Result<Session, ConnectionLimitReached> {
        self.admit(false)
    }

    fn admit(&self, probed: bool) -> Result<Session, ConnectionLimitReached> {
        if self.connections.len() >= self.max_connections {
            return Err(ConnectionLimitReached(self.max_connections));
        }

        let id = ConnectionId::new();
        let (tx, outbound) = mpsc::channel(SEND_BUFFER);
        let closed = Arc::new(Notify::new());
        self.connections.insert(
            id,
            ConnectionHandle {
                tx,
                alive: AtomicBool::new(true),
                probed,
                closed: closed.clone(),
            },
        );
        self.registry.register_connection(id);
        metrics::record_active_connections(self.connections.len());
        tracing::info!(connection_id = %id, "Client connected");

        Ok(Session { id, outbound, closed })
    }

    /// Queue a text frame. False means the connection is gone or not keeping up.
    pub fn send(&self, id: ConnectionId, text: String) -> bool {
        let Some(handle) = self.connections.get(&id) else {
            return false;
        };
        match handle.tx.try_send(Outbound::Text(text)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(connection_id = %id, "Send buffer full, dropping slow connection");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Record a probe answer.
    pub fn mark_alive(&self, id: ConnectionId) {
        if let Some(handle) = self.connections.get(&id) {
            handle.alive.store(true, Ordering::Release);
        }
    }

    /// Remove a connection and every filter it held.
    pub fn deregister(&self, id: ConnectionId) -> bool {
        let Some((_, handle)) = self.connections.remove(&id) else {
            return false;
        };
        handle.closed.notify_one();
        let filters = self.registry.remove_connection(id);
        metrics::record_active_connections(self.connections.len());
        tracing::info!(connection_id = %id, filters, "Client disconnected");
        true
    }

    /// Close the socket and deregister.
    pub fn force_close(&self, id: ConnectionId) -> bool {
        if let Some(handle) = self.connections.get(&id) {
            let _ = handle.tx.try_send(Outbound::Close);
        }
        self.deregister(id)
    }

    /// Drop a connection the dispatcher could not reach. Filters left behind
    /// by an id the manager no longer tracks are cleared as well.
    pub fn prune(&self, id: ConnectionId) {
        if !self.force_close(id) {
            self.registry.remove_connection(id);
        }
    }

    /// One heartbeat sweep: terminate connections that never answered the
    /// previous probe, probe the rest. Returns how many were terminated.
    pub fn heartbeat_tick(&self) -> usize {
        let mut dead = Vec::new();
        for entry in self.connections.iter() {
            if !entry.probed {
                continue;
            }
            if entry.alive.swap(false, Ordering::AcqRel) {
                if entry.tx.try_send(Outbound::Ping).is_err() {
                    dead.push(*entry.key());
                }
            } else {
                dead.push(*entry.key());
            }
        }

        for id in &dead {
            tracing::info!(connection_id = %id, "Terminating unresponsive connection");
            metrics::record_heartbeat_termination();
            self.force_close(*id);
        }
        dead.len()
    }

    /// Close every connection, e.g. on shutdown.
    pub fn close_all(&self) -> usize {
        let ids: Vec<ConnectionId> = self.connections.iter().map(|e| *e.key()).collect();
        for id in &ids {
            self.force_close(*id);
        }
        ids.len()
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }
}
