use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Unique identifier for one live connection.
///
/// Assigned when the connection registers; a reconnecting client gets a fresh
/// id. Registry membership only, never a business identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Send capability for one connection: the id plus the channel feeding its
/// session.
///
/// The peer may vanish at any time without notice, so `send` can fail on a
/// handle that looked open a moment ago; callers treat that as a dead
/// connection, never as a fault.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: UnboundedSender<String>) -> Self {
        Self { id, sender }
    }

    /// Creates a fresh connection handle together with the receiving end the
    /// session will drain.
    pub fn open() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(ConnectionId::new(), tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// False once the receiving session has gone away.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues a payload for the session. Never blocks; errors only when the
    /// receiver is gone.
    pub fn send(&self, payload: String) -> Result<(), SendError<String>> {
        self.sender.send(payload)
    }
}

/// Connection registry for the fan-out surface.
///
/// The only mutable shared state in the service: the acceptor registers and
/// deregisters while the dispatcher iterates snapshots. Membership is
/// best-effort liveness; a handle may already be dead when snapshotted, and
/// each write handles that case itself.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Re-registering an existing id is a no-op.
    pub async fn register(&self, conn: ConnectionHandle) {
        let mut guard = self.inner.write().await;
        let id = conn.id();
        guard.entry(id).or_insert(conn);

        tracing::debug!("registered connection {}, total: {}", id, guard.len());
    }

    /// Removes a connection. No-op if absent, so lazy pruning during
    /// broadcast and the session's own cleanup can race safely.
    pub async fn deregister(&self, id: ConnectionId) {
        let mut guard = self.inner.write().await;
        if guard.remove(&id).is_some() {
            tracing::debug!("deregistered connection {}, remaining: {}", id, guard.len());
        }
    }

    /// Clones the current membership for iteration. The lock is held only for
    /// the clone, never across a write to any connection.
    pub async fn snapshot(&self) -> Vec<ConnectionHandle> {
        let guard = self.inner.read().await;
        guard.values().cloned().collect()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.inner.read().await.contains_key(&id)
    }

    /// Current connection count (for status endpoints and logs).
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
