//! Live subscriber set
//!
//! A [`ConnectionHandle`] is the sending side of one stream's outbound queue.
//! The registry owns a clone of every live handle; the connection's writer task
//! owns the receiving side. Delivery never waits: a dead writer or a full queue
//! shows up as a failed delivery, and the handle is evicted.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::{HubError, HubResult};

/// One serialized JSON text frame, shared between all recipients of a broadcast.
pub type Frame = Arc<str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Frame>,
    evicted: Arc<Notify>,
}

impl ConnectionHandle {
    /// Create a handle and the queue its writer task drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            outbound,
            evicted: Arc::new(Notify::new()),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue one frame without waiting. A full queue is a failure, not a stall.
    pub fn deliver(&self, frame: Frame) -> HubResult<()> {
        self.outbound.try_send(frame).map_err(|err| HubError::Delivery {
            connection: self.id,
            reason: match err {
                TrySendError::Full(_) => "outbound queue full",
                TrySendError::Closed(_) => "writer gone",
            },
        })
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    /// Tell the connection's gateway to drop it. Sticky: a later
    /// [`Eviction::wait`] returns at once.
    pub fn evict(&self) {
        self.evicted.notify_one();
    }

    /// Watch for [`evict`](Self::evict) without keeping the queue open.
    pub fn eviction(&self) -> Eviction {
        Eviction(Arc::clone(&self.evicted))
    }
}

#[derive(Debug, Clone)]
pub struct Eviction(Arc<Notify>);

impl Eviction {
    pub async fn wait(&self) {
        self.0.notified().await;
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl Hash for ConnectionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a handle with the same id is already registered.
    pub fn add(&self, handle: ConnectionHandle) -> bool {
        let mut connections = self.connections.lock();
        if connections.contains_key(&handle.id) {
            return false;
        }
        connections.insert(handle.id, handle);
        true
    }

    pub fn remove(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(&id).is_some()
    }

    /// Remove a batch under a single lock acquisition.
    pub fn remove_all(&self, ids: &[ConnectionId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let mut connections = self.connections.lock();
        ids.iter()
            .filter(|id| connections.remove(id).is_some())
            .count()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.lock().contains_key(&id)
    }

    pub fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.connections.lock().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Add `handle` for as long as the returned guard lives.
    ///
    /// `None` if the id is already taken; the existing entry is left alone.
    pub fn register(self: &Arc<Self>, handle: ConnectionHandle) -> Option<Registration> {
        let id = handle.id;
        self.add(handle).then(|| Registration {
            registry: Arc::clone(self),
            id,
        })
    }
}

/// Registry membership tied to a scope.
///
/// Dropping it removes the connection, whichever way the owning task exits.
#[derive(Debug)]
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.remove(self.id) {
            tracing::debug!(connection = %self.id, "connection unregistered");
        }
    }
}
