use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;
use utoipa::ToSchema;

use crate::dto::sse::ServerEvent;

/// Committed change of the session store or its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum StoreEvent {
    /// A session was created locally.
    SessionCreated {
        /// Local session id.
        session_id: String,
    },
    /// Games or the remote link of a session changed.
    SessionUpdated {
        /// Local session id.
        session_id: String,
    },
    /// A session was removed locally.
    SessionDeleted {
        /// Local session id.
        session_id: String,
    },
    /// A player was renamed or removed across sessions.
    PlayersChanged {
        /// Local ids of the sessions touched.
        sessions: Vec<String>,
    },
    /// A settings document was written.
    SettingsChanged {
        /// Storage key of the document.
        key: String,
    },
    /// The premium flag flipped.
    EntitlementChanged {
        /// New value.
        premium: bool,
    },
}

impl StoreEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::SessionCreated { .. } => "session_created",
            StoreEvent::SessionUpdated { .. } => "session_updated",
            StoreEvent::SessionDeleted { .. } => "session_deleted",
            StoreEvent::PlayersChanged { .. } => "players_changed",
            StoreEvent::SettingsChanged { .. } => "settings_changed",
            StoreEvent::EntitlementChanged { .. } => "entitlement_changed",
        }
    }
}

/// Broadcast hub fanning store events out to SSE subscribers.
pub struct EventHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventHub {
    /// Hub keeping up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive the events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to current subscribers. Nobody listening is not an error.
    pub fn publish(&self, event: StoreEvent) {
        match ServerEvent::json(Some(event.name().to_string()), &event) {
            Ok(payload) => {
                let _ = self.sender.send(payload);
            }
            Err(err) => warn!(event = event.name(), error = %err, "failed to encode store event"),
        }
    }
}
