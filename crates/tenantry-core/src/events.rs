//! Typed lifecycle events.
//!
//! Replaces string-named signal dispatch with an enumerated event type
//! carried over a broadcast channel. Emission is fire-and-forget: an
//! event with no live subscribers is simply dropped.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::schema::SchemaName;

/// Notifications fired by the lifecycle services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A fresh tenant user was created for a public user inside a tenant.
    UserAdded {
        user_id: Uuid,
        tenant_id: Uuid,
        schema: SchemaName,
    },
    /// A public user was unlinked from a tenant.
    UserRemoved {
        user_id: Uuid,
        tenant_id: Uuid,
        schema: SchemaName,
        soft: bool,
    },
    /// A public user was attached to a pre-existing tenant user.
    UserConnected {
        user_id: Uuid,
        tenant_id: Uuid,
        schema: SchemaName,
    },
    /// A public user was detached from its tenant user.
    UserDisconnected {
        user_id: Uuid,
        tenant_id: Uuid,
        schema: SchemaName,
    },
    /// A public user was created (or revived from an inactive row).
    UserCreated { user_id: Uuid },
    /// A public user was soft-deleted.
    UserDeleted { user_id: Uuid },
}

/// Broadcast channel for [`LifecycleEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Send an event to all current subscribers. Errors from an empty
    /// subscriber set are ignored.
    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        bus.emit(LifecycleEvent::UserCreated { user_id: id });

        let event = rx.recv().await.unwrap();
        assert_eq!(event, LifecycleEvent::UserCreated { user_id: id });
    }

    #[test]
    fn emit_without_subscribers_is_a_noop() {
        let bus = EventBus::default();
        bus.emit(LifecycleEvent::UserDeleted {
            user_id: Uuid::new_v4(),
        });
    }
}
