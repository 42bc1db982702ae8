//! Subscriber registry for the presence fan-out
//!
//! An explicit mapping from connection id to a push handle. Subscribers are
//! added when a stream connection is established and removed either when the
//! transport reports closure (the receiving side is dropped, so the next send
//! fails) or via an explicit `remove`.

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// A registered subscriber connection
pub struct Subscriber {
    sender: mpsc::UnboundedSender<Bytes>,
}

/// Registry of open presence-stream connections
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: DashMap<Uuid, Subscriber>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Register a new connection; returns its id and the receiving half that
    /// feeds the connection's response body.
    pub fn add(&self) -> (Uuid, mpsc::UnboundedReceiver<Bytes>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(id, Subscriber { sender: tx });
        debug!("Presence subscriber {} connected ({} total)", id, self.subscribers.len());
        (id, rx)
    }

    /// Remove a connection from the registry
    pub fn remove(&self, id: &Uuid) {
        if self.subscribers.remove(id).is_some() {
            debug!("Presence subscriber {} removed ({} left)", id, self.subscribers.len());
        }
    }

    /// Push a frame to every open connection, best-effort.
    ///
    /// A failed send means the receiving side is gone; that subscriber is
    /// pruned without affecting delivery to the others.
    pub fn push_all(&self, frame: Bytes) {
        let mut dead = Vec::new();
        for entry in self.subscribers.iter() {
            if entry.value().sender.send(frame.clone()).is_err() {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.remove(&id);
        }
    }

    /// Number of currently open connections
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
