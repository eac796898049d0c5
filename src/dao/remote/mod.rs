//! Remote mirror of the session store.
//!
//! Gateways never raise: every failure is logged and mapped to a sentinel
//! (`None`, an empty list, `0` or `false`) that callers treat as "not applied".

#[cfg(test)]
pub mod memory;
/// Supabase (PostgREST) gateway.
#[cfg(feature = "supabase-remote")]
pub mod supabase;

use std::time::SystemTime;

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::dao::{models::GameDetails, storage::StorageResult};

/// Authenticated caller on whose behalf remote writes are issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Supabase auth user id, owner of every row written.
    pub user_id: String,
    /// JWT sent as the Bearer token.
    pub access_token: String,
}

/// Participant row as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParticipant {
    /// Row id.
    pub id: String,
    /// Display name, unique within its session.
    pub name: String,
}

/// Session row created remotely, with its participant rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    /// Remote session id.
    pub session_id: String,
    /// Participant rows in the order they were requested.
    pub participants: Vec<RemoteParticipant>,
}

/// Game row acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGame {
    /// Remote game id.
    pub game_id: String,
}

/// Entry of the remote session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSessionSummary {
    /// Remote session id.
    pub id: String,
    /// Row creation time.
    pub created_at: SystemTime,
    /// Participant rows of the session.
    pub participants: Vec<RemoteParticipant>,
}

/// Points of one participant in a remote game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteScore {
    /// Participant row the points belong to.
    pub participant_id: String,
    /// Points for the deal.
    pub score: i32,
}

/// Game row with its scores.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteGame {
    /// Remote game id.
    pub id: String,
    /// Row creation time, used as the game timestamp on import.
    pub created_at: SystemTime,
    /// Deal description, `None` when absent or unreadable.
    pub details: Option<GameDetails>,
    /// Scores keyed by participant row.
    pub scores: Vec<RemoteScore>,
}

/// Session with all of its participants and games.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSessionFull {
    /// Remote session id.
    pub id: String,
    /// Row creation time.
    pub created_at: SystemTime,
    /// Participant rows in creation order.
    pub participants: Vec<RemoteParticipant>,
    /// Games oldest first.
    pub games: Vec<RemoteGame>,
}

/// Which participant rows a rename applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameScope {
    /// Every row of the caller carrying the old name, across all sessions.
    Everywhere,
    /// Only rows belonging to the listed remote sessions.
    Sessions(Vec<String>),
}

/// Abstraction over the hosted backend mirroring sessions and games.
pub trait RemoteGateway: Send + Sync {
    /// Replace the identity used for subsequent calls.
    fn set_identity(&self, identity: Option<Identity>);
    /// Identity used for the next calls, `None` when signed out.
    fn identity(&self) -> Option<Identity>;

    /// Create a session row and one participant row per name.
    fn create_session(&self, names: Vec<String>) -> BoxFuture<'static, Option<CreatedSession>>;
    /// Participant rows of a session in creation order.
    fn participants(&self, session_id: String) -> BoxFuture<'static, Vec<RemoteParticipant>>;
    /// Create a game row and its score rows. Names without a participant row are skipped.
    fn add_game(
        &self,
        session_id: String,
        details: Option<GameDetails>,
        scores: IndexMap<String, i32>,
    ) -> BoxFuture<'static, Option<CreatedGame>>;
    /// Sessions of the caller, newest first.
    fn list_sessions(&self) -> BoxFuture<'static, Vec<RemoteSessionSummary>>;
    /// A session with its participants and games.
    fn session_full(&self, session_id: String) -> BoxFuture<'static, Option<RemoteSessionFull>>;
    /// Rename participant rows in `scope`. Returns the number of rows updated.
    fn rename_participants(
        &self,
        old_name: String,
        new_name: String,
        scope: RenameScope,
    ) -> BoxFuture<'static, usize>;
    /// Delete a session row. Its participants, games and scores go with it.
    fn delete_session(&self, session_id: String) -> BoxFuture<'static, bool>;
    /// Premium flag of the caller's profile, creating a non-premium profile when missing.
    fn load_premium(&self) -> BoxFuture<'static, bool>;
    /// Upsert the premium flag of the caller's profile.
    fn store_premium(&self, enabled: bool) -> BoxFuture<'static, bool>;
    /// Check that the backend answers. Unlike the other calls this one reports the error.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
