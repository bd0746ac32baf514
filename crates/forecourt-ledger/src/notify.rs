//! # Change Notification Hub
//!
//! Broadcasts "entity X changed" events after successful ledger
//! operations so dependent views can refresh.
//!
//! ## Fire-and-Forget Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Coordinator ──publish──► broadcast channel ──► subscriber 1 (UI)      │
//! │                                             ──► subscriber 2 (cache)   │
//! │                                                                         │
//! │  • Publishing never blocks and never fails the operation: an event     │
//! │    with zero receivers is simply dropped.                              │
//! │  • Slow subscribers can lag and miss events (broadcast ring buffer);   │
//! │    they re-read the store on Lagged, which is the refresh they         │
//! │    wanted anyway.                                                      │
//! │  • Subscriber fan-out beyond this channel is an external concern.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Channel capacity before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Which entity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Product,
    Supplier,
}

/// One change notification, keyed by entity identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChanged {
    pub entity: EntityKind,
    pub id: String,
}

impl EntityChanged {
    pub fn account(id: impl Into<String>) -> Self {
        EntityChanged {
            entity: EntityKind::Account,
            id: id.into(),
        }
    }

    pub fn product(id: impl Into<String>) -> Self {
        EntityChanged {
            entity: EntityKind::Product,
            id: id.into(),
        }
    }

    pub fn supplier(id: impl Into<String>) -> Self {
        EntityChanged {
            entity: EntityKind::Supplier,
            id: id.into(),
        }
    }
}

/// Broadcast hub for change notifications.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<EntityChanged>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    /// Creates a hub with the default capacity.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        ChangeHub { sender }
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EntityChanged> {
        self.sender.subscribe()
    }

    /// Publishes a change notification. Never fails; nobody listening is
    /// a legal state.
    pub fn publish(&self, event: EntityChanged) {
        debug!(entity = ?event.entity, id = %event.id, "Entity changed");
        let _ = self.sender.send(event);
    }

    /// Publishes a batch of notifications.
    pub fn publish_all(&self, events: impl IntoIterator<Item = EntityChanged>) {
        for event in events {
            self.publish(event);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let hub = ChangeHub::new();
        let mut rx = hub.subscribe();

        hub.publish(EntityChanged::product("p1"));
        hub.publish(EntityChanged::account("a1"));

        assert_eq!(rx.recv().await.unwrap(), EntityChanged::product("p1"));
        assert_eq!(rx.recv().await.unwrap(), EntityChanged::account("a1"));
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let hub = ChangeHub::new();
        hub.publish(EntityChanged::supplier("s1"));
        hub.publish_all([EntityChanged::product("p1"), EntityChanged::account("a1")]);
    }
}
