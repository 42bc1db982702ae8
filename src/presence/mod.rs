//! Presence fan-out
//!
//! Pushes updated user records to every subscribed viewer over server-sent
//! events. The hub is constructed explicitly in `main` and handed to the
//! server state; there is no module-level singleton. Delivery is best-effort
//! and unpersisted: a viewer not connected at broadcast time catches up via
//! the directory poller's periodic full pull.

pub mod registry;

use bytes::Bytes;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

pub use registry::SubscriberRegistry;

/// Name of the SSE event carrying an updated user record
pub const LOCATION_UPDATE_EVENT: &str = "location-update";

/// Hub broadcasting presence updates to subscribed connections
#[derive(Default)]
pub struct PresenceHub {
    registry: SubscriberRegistry,
}

impl PresenceHub {
    pub fn new() -> Self {
        Self {
            registry: SubscriberRegistry::new(),
        }
    }

    /// Register a viewer connection; the receiver feeds its SSE body
    pub fn subscribe(&self) -> (Uuid, tokio::sync::mpsc::UnboundedReceiver<Bytes>) {
        self.registry.add()
    }

    /// Detach a viewer connection
    pub fn unsubscribe(&self, id: &Uuid) {
        self.registry.remove(id);
    }

    /// Serialize `payload` as a named SSE event and push it to every open
    /// connection.
    pub fn broadcast<T: Serialize>(&self, event: &str, payload: &T) {
        let data = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                warn!("Presence broadcast serialization failed: {}", e);
                return;
            }
        };
        self.registry.push_all(sse_frame(event, &data));
    }

    /// Number of currently subscribed viewers
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

/// Format one SSE frame: `event: <name>\ndata: <json>\n\n`
fn sse_frame(event: &str, data: &str) -> Bytes {
    Bytes::from(format!("event: {}\ndata: {}\n\n", event, data))
}

/// Removes its subscriber from the hub when dropped.
///
/// A stream response owns one of these alongside its receiver, so the
/// registry entry disappears as soon as the connection ends instead of
/// lingering until a broadcast's failed send prunes it.
pub struct SubscriberGuard {
    hub: std::sync::Arc<PresenceHub>,
    id: Uuid,
}

impl SubscriberGuard {
    pub fn new(hub: std::sync::Arc<PresenceHub>, id: Uuid) -> Self {
        Self { hub, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.id);
    }
}
