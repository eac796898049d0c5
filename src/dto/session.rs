use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::SessionEntity,
    dto::{format_system_time, game::GameView, validation::validate_participants},
    services::session_service::{LinkedSession, SyncReport},
};

/// Players of a new session. Names are trimmed and deduplicated.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    #[validate(custom(function = "validate_participants"))]
    pub participants: Vec<String>,
}

/// Session without its games, for listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub participants: Vec<String>,
    pub created_at: String,
    pub game_count: usize,
}

impl From<SessionEntity> for SessionSummary {
    fn from(session: SessionEntity) -> Self {
        Self {
            game_count: session.games.len(),
            id: session.id,
            remote_id: session.remote_id,
            participants: session.participants,
            created_at: format_system_time(session.created_at),
        }
    }
}

/// Session with all of its games.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDetail {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub participants: Vec<String>,
    pub created_at: String,
    pub games: Vec<GameView>,
}

impl From<SessionEntity> for SessionDetail {
    fn from(session: SessionEntity) -> Self {
        Self {
            id: session.id,
            remote_id: session.remote_id,
            participants: session.participants,
            created_at: format_system_time(session.created_at),
            games: session.games.into_iter().map(Into::into).collect(),
        }
    }
}

/// Accumulated points per player.
#[derive(Debug, Serialize, ToSchema)]
pub struct TotalsResponse {
    pub session_id: String,
    pub totals: IndexMap<String, i64>,
}

/// Local session mirroring a remote one.
#[derive(Debug, Serialize, ToSchema)]
pub struct RemoteSessionLink {
    pub local_id: String,
    pub remote_id: String,
    pub participants: Vec<String>,
    pub created_at: String,
}

impl From<LinkedSession> for RemoteSessionLink {
    fn from(linked: LinkedSession) -> Self {
        Self {
            local_id: linked.local_id,
            remote_id: linked.remote_id,
            participants: linked.participants,
            created_at: format_system_time(linked.created_at),
        }
    }
}

/// Local id of an imported remote session.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportResponse {
    pub local_id: String,
}

/// Counters of a sync run.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncReportResponse {
    pub sessions_linked: usize,
    pub games_pushed: usize,
    pub sessions_failed: usize,
}

impl From<SyncReport> for SyncReportResponse {
    fn from(report: SyncReport) -> Self {
        Self {
            sessions_linked: report.sessions_linked,
            games_pushed: report.games_pushed,
            sessions_failed: report.sessions_failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_requires_a_name() {
        let blank = CreateSessionRequest {
            participants: vec!["  ".into()],
        };
        assert!(blank.validate().is_err());

        let ok = CreateSessionRequest {
            participants: vec!["Alice".into(), "Bob".into()],
        };
        assert!(ok.validate().is_ok());
    }
}
