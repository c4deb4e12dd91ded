use tokio::sync::broadcast;

use crate::models::user::UserProfile;

/// Capacity of the broadcast channel. Lifecycle events are rare; a slow
/// subscriber that falls further behind than this sees a `Lagged` error
/// from `recv`, not a blocked publisher.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A session lifecycle event.
///
/// Only transitions are published: a fresh login, entry into the warning
/// window, and the moment the session dies. Steady-state ticks are silent.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A login completed and the session was persisted.
    LoginSuccess { user: UserProfile },
    /// The session entered the expiring-soon window.
    ExpiringSoon {
        remaining_time_ms: i64,
        formatted_time: String,
    },
    /// The session expired or was invalidated by the server.
    Expired { message: String },
}

/// The session service's event bus.
///
/// An explicit publish/subscribe object rather than an ambient global
/// event target: subscribers hold a receiver and unsubscribe by dropping
/// it, so listener lifetime is deterministic. Multiple independently
/// mounted consumers (toast banner, route guard, header widget) can react
/// to the same event without the facade knowing them.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a new `EventBus`.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event. Emission with zero subscribers is a no-op.
    pub fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("No subscribers for session event: {:?}", e.0);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
