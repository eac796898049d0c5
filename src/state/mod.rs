mod entitlement;
mod events;

use std::sync::Arc;

use dashmap::DashSet;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};

use crate::dao::{
    local_store::LocalStore, models::StoreSnapshot, remote::RemoteGateway,
    settings::SettingsRepository,
};

pub use self::entitlement::Entitlement;
pub use self::events::{EventHub, StoreEvent};

/// Handle shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;

/// Number of sessions a free-tier user may keep.
pub const DEFAULT_SESSION_LIMIT: usize = 5;
/// Events buffered per change-feed subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 32;

/// Which remote participant rows a player rename touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Every row of the signed-in user carrying the old name.
    #[default]
    Everywhere,
    /// Only rows of linked sessions that contained the old name locally.
    LinkedSessions,
}

/// Tunables of the session store.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Sessions a free-tier user may keep.
    pub session_limit: usize,
    /// Remote rows touched by a player rename.
    pub rename_policy: RenamePolicy,
    /// Change-feed buffer size.
    pub event_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            session_limit: DEFAULT_SESSION_LIMIT,
            rename_policy: RenamePolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Central application state owning the session map and its collaborators.
pub struct AppState {
    sessions: RwLock<StoreSnapshot>,
    local: LocalStore,
    settings: SettingsRepository,
    remote: RwLock<Option<Arc<dyn RemoteGateway>>>,
    entitlement: Entitlement,
    events: EventHub,
    sync_gate: Mutex<()>,
    pushing_games: DashSet<String>,
    options: StoreOptions,
}

impl AppState {
    /// Build the state, hydrating the session map from local storage.
    ///
    /// The application runs local-only until a remote gateway is installed.
    pub fn new(local: LocalStore, options: StoreOptions) -> SharedState {
        let snapshot = local.load_sessions();
        Arc::new(Self {
            sessions: RwLock::new(snapshot),
            settings: SettingsRepository::new(local.clone()),
            local,
            remote: RwLock::new(None),
            entitlement: Entitlement::new(),
            events: EventHub::new(options.event_capacity),
            sync_gate: Mutex::new(()),
            pushing_games: DashSet::new(),
            options,
        })
    }

    /// Inspect the session map without cloning it.
    pub async fn read_sessions<T>(&self, read: impl FnOnce(&StoreSnapshot) -> T) -> T {
        let guard = self.sessions.read().await;
        read(&guard)
    }

    /// Exclusive access to the session map. Callers persist through [`SessionsGuard::commit`].
    pub async fn write_sessions(&self) -> SessionsGuard<'_> {
        SessionsGuard {
            guard: self.sessions.write().await,
            local: &self.local,
        }
    }

    /// Store the session map is persisted to.
    pub fn local_store(&self) -> &LocalStore {
        &self.local
    }

    /// User settings.
    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    /// Obtain a handle to the remote gateway, if one is installed.
    pub async fn remote(&self) -> Option<Arc<dyn RemoteGateway>> {
        let guard = self.remote.read().await;
        guard.as_ref().cloned()
    }

    /// Install a remote gateway, leaving local-only mode.
    pub async fn install_remote(&self, gateway: Arc<dyn RemoteGateway>) {
        let mut guard = self.remote.write().await;
        *guard = Some(gateway);
    }

    /// Premium flag of the signed-in user.
    pub fn entitlement(&self) -> &Entitlement {
        &self.entitlement
    }

    /// Broadcast hub for the change feed.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Serializes runs of the unsynced-session push.
    pub fn sync_gate(&self) -> &Mutex<()> {
        &self.sync_gate
    }

    /// Reserve the remote push of a game. `None` while another task is pushing it.
    pub fn claim_game_push(&self, game_id: &str) -> Option<GamePushClaim<'_>> {
        self.pushing_games
            .insert(game_id.to_string())
            .then(|| GamePushClaim {
                games: &self.pushing_games,
                game_id: game_id.to_string(),
            })
    }

    /// Tunables the state was built with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }
}

/// Exclusive right to push one game remotely, released on drop.
pub struct GamePushClaim<'a> {
    games: &'a DashSet<String>,
    game_id: String,
}

impl Drop for GamePushClaim<'_> {
    fn drop(&mut self) {
        self.games.remove(&self.game_id);
    }
}

/// Write guard over the session map that knows how to persist it.
pub struct SessionsGuard<'a> {
    guard: RwLockWriteGuard<'a, StoreSnapshot>,
    local: &'a LocalStore,
}

impl SessionsGuard<'_> {
    /// Persist the current map to local storage. Failures are logged by the store.
    ///
    /// The lock stays held until the write completes, so writes land in commit order.
    pub async fn commit(&self) {
        self.local.save_sessions(&self.guard).await;
    }
}

impl std::ops::Deref for SessionsGuard<'_> {
    type Target = StoreSnapshot;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl std::ops::DerefMut for SessionsGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::{
        kv::{FileKvBackend, MemoryKvBackend},
        models::SessionEntity,
    };

    #[test]
    fn game_push_claims_are_exclusive_until_dropped() {
        let state = AppState::new(
            LocalStore::new(Arc::new(MemoryKvBackend::new())),
            StoreOptions::default(),
        );

        let claim = state.claim_game_push("g_1");
        assert!(claim.is_some());
        assert!(state.claim_game_push("g_1").is_none());
        assert!(state.claim_game_push("g_2").is_some());

        drop(claim);
        assert!(state.claim_game_push("g_1").is_some());
    }

    #[tokio::test]
    async fn commit_writes_through_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let local = || LocalStore::new(Arc::new(FileKvBackend::new(dir.path().join("store"))));
        let state = AppState::new(local(), StoreOptions::default());

        {
            let mut sessions = state.write_sessions().await;
            sessions.sessions.insert(
                "sess_1".into(),
                SessionEntity {
                    id: "sess_1".into(),
                    remote_id: None,
                    participants: vec!["A".into()],
                    games: Vec::new(),
                    created_at: SystemTime::UNIX_EPOCH,
                },
            );
            sessions.commit().await;
        }

        let reloaded = local().load_sessions();
        assert_eq!(reloaded.sessions["sess_1"].participants, vec!["A"]);
    }
}
