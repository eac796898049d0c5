//! In-process gateway used by the service tests.

use std::{
    sync::{
        Mutex, PoisonError, RwLock,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::dao::{
    models::GameDetails,
    remote::{
        CreatedGame, CreatedSession, Identity, RemoteGame, RemoteGateway, RemoteParticipant,
        RemoteScore, RemoteSessionFull, RemoteSessionSummary, RenameScope,
    },
    storage::{StorageError, StorageResult},
};

#[derive(Default)]
struct Tables {
    sessions: IndexMap<String, RemoteSessionFull>,
    premium: Option<bool>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn next_timestamp(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + self.next_id)
    }
}

/// Fake backend keeping rows in memory, counting calls and failing on demand.
pub struct MemoryGateway {
    tables: Mutex<Tables>,
    identity: RwLock<Option<Identity>>,
    failing: AtomicBool,
    latency_ms: AtomicU64,
    calls: DashMap<&'static str, usize>,
}

impl MemoryGateway {
    /// Gateway already signed in as `user-1`.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            identity: RwLock::new(Some(Identity {
                user_id: "user-1".into(),
                access_token: "token-1".into(),
            })),
            failing: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            calls: DashMap::new(),
        }
    }

    /// Make every subsequent call return its sentinel.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every reply by `latency`. Rows are still written when the call is made.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of times `operation` was invoked, failed calls included.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.get(operation).map(|count| *count).unwrap_or(0)
    }

    pub fn set_premium_row(&self, premium: Option<bool>) {
        self.tables().premium = premium;
    }

    pub fn premium_row(&self) -> Option<bool> {
        self.tables().premium
    }

    /// Seed a remote session with games whose scores are keyed by participant name.
    pub fn seed_session(
        &self,
        names: &[&str],
        games: Vec<(Option<GameDetails>, Vec<(&str, i32)>)>,
    ) -> String {
        let mut tables = self.tables();
        let session_id = tables.next_id("remote-session");
        let created_at = tables.next_timestamp();
        let participants = names
            .iter()
            .map(|name| RemoteParticipant {
                id: tables.next_id("participant"),
                name: (*name).to_string(),
            })
            .collect::<Vec<_>>();

        let mut remote_games = Vec::new();
        for (details, scores) in games {
            let id = tables.next_id("game");
            let created_at = tables.next_timestamp();
            let scores = scores
                .into_iter()
                .map(|(name, score)| RemoteScore {
                    participant_id: participants
                        .iter()
                        .find(|p| p.name == name)
                        .map(|p| p.id.clone())
                        .unwrap_or_else(|| format!("unknown-{name}")),
                    score,
                })
                .collect();
            remote_games.push(RemoteGame {
                id,
                created_at,
                details,
                scores,
            });
        }

        tables.sessions.insert(
            session_id.clone(),
            RemoteSessionFull {
                id: session_id.clone(),
                created_at,
                participants,
                games: remote_games,
            },
        );
        session_id
    }

    /// Stored copy of a remote session.
    pub fn session(&self, session_id: &str) -> Option<RemoteSessionFull> {
        self.tables().sessions.get(session_id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.tables().sessions.len()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and tell whether it may proceed.
    fn enter(&self, operation: &'static str) -> bool {
        *self.calls.entry(operation).or_insert(0) += 1;
        !self.failing.load(Ordering::SeqCst) && self.identity().is_some()
    }

    fn reply<T: Send + 'static>(&self, value: T) -> BoxFuture<'static, T> {
        let latency = Duration::from_millis(self.latency_ms.load(Ordering::SeqCst));
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            value
        })
    }
}

impl RemoteGateway for MemoryGateway {
    fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = identity;
    }

    fn identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn create_session(&self, names: Vec<String>) -> BoxFuture<'static, Option<CreatedSession>> {
        if !self.enter("create_session") {
            return self.reply(None);
        }
        let mut tables = self.tables();
        let session_id = tables.next_id("remote-session");
        let created_at = tables.next_timestamp();
        let participants = names
            .into_iter()
            .map(|name| RemoteParticipant {
                id: tables.next_id("participant"),
                name,
            })
            .collect::<Vec<_>>();
        tables.sessions.insert(
            session_id.clone(),
            RemoteSessionFull {
                id: session_id.clone(),
                created_at,
                participants: participants.clone(),
                games: Vec::new(),
            },
        );
        self.reply(Some(CreatedSession {
            session_id,
            participants,
        }))
    }

    fn participants(&self, session_id: String) -> BoxFuture<'static, Vec<RemoteParticipant>> {
        if !self.enter("participants") {
            return self.reply(Vec::new());
        }
        let participants = self
            .session(&session_id)
            .map(|session| session.participants)
            .unwrap_or_default();
        self.reply(participants)
    }

    fn add_game(
        &self,
        session_id: String,
        details: Option<GameDetails>,
        scores: IndexMap<String, i32>,
    ) -> BoxFuture<'static, Option<CreatedGame>> {
        if !self.enter("add_game") {
            return self.reply(None);
        }
        let mut tables = self.tables();
        let game_id = tables.next_id("game");
        let created_at = tables.next_timestamp();
        let Some(session) = tables.sessions.get_mut(&session_id) else {
            return self.reply(None);
        };
        let scores = scores
            .into_iter()
            .filter_map(|(name, score)| {
                session
                    .participants
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| RemoteScore {
                        participant_id: p.id.clone(),
                        score,
                    })
            })
            .collect();
        session.games.push(RemoteGame {
            id: game_id.clone(),
            created_at,
            details,
            scores,
        });
        self.reply(Some(CreatedGame { game_id }))
    }

    fn list_sessions(&self) -> BoxFuture<'static, Vec<RemoteSessionSummary>> {
        if !self.enter("list_sessions") {
            return self.reply(Vec::new());
        }
        let mut summaries = self
            .tables()
            .sessions
            .values()
            .map(|session| RemoteSessionSummary {
                id: session.id.clone(),
                created_at: session.created_at,
                participants: session.participants.clone(),
            })
            .collect::<Vec<_>>();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.reply(summaries)
    }

    fn session_full(&self, session_id: String) -> BoxFuture<'static, Option<RemoteSessionFull>> {
        if !self.enter("session_full") {
            return self.reply(None);
        }
        self.reply(self.session(&session_id))
    }

    fn rename_participants(
        &self,
        old_name: String,
        new_name: String,
        scope: RenameScope,
    ) -> BoxFuture<'static, usize> {
        if !self.enter("rename_participants") {
            return self.reply(0);
        }
        let mut tables = self.tables();
        let mut updated = 0;
        for (id, session) in tables.sessions.iter_mut() {
            if let RenameScope::Sessions(ids) = &scope {
                if !ids.contains(id) {
                    continue;
                }
            }
            for participant in session.participants.iter_mut() {
                if participant.name == old_name {
                    participant.name = new_name.clone();
                    updated += 1;
                }
            }
        }
        self.reply(updated)
    }

    fn delete_session(&self, session_id: String) -> BoxFuture<'static, bool> {
        if !self.enter("delete_session") {
            return self.reply(false);
        }
        let removed = self.tables().sessions.shift_remove(&session_id).is_some();
        self.reply(removed)
    }

    fn load_premium(&self) -> BoxFuture<'static, bool> {
        if !self.enter("load_premium") {
            return self.reply(false);
        }
        let mut tables = self.tables();
        let premium = *tables.premium.get_or_insert(false);
        self.reply(premium)
    }

    fn store_premium(&self, enabled: bool) -> BoxFuture<'static, bool> {
        if !self.enter("store_premium") {
            return self.reply(false);
        }
        self.tables().premium = Some(enabled);
        self.reply(true)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        if self.failing.load(Ordering::SeqCst) {
            self.reply(Err(StorageError::Disabled))
        } else {
            self.reply(Ok(()))
        }
    }
}
