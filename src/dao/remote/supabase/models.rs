use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::warn;

use crate::dao::{
    models::GameDetails,
    remote::{RemoteGame, RemoteParticipant, RemoteScore, RemoteSessionFull, RemoteSessionSummary},
};

pub const SESSIONS_TABLE: &str = "sessions";
pub const PARTICIPANTS_TABLE: &str = "session_participants";
pub const GAMES_TABLE: &str = "games";
pub const SCORES_TABLE: &str = "game_scores";
pub const PROFILES_TABLE: &str = "profiles";

#[derive(Debug, Deserialize)]
pub struct IdRow {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct NewSessionRow<'a> {
    pub owner_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewParticipantRow<'a> {
    pub session_id: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewGameRow<'a> {
    pub session_id: &'a str,
    pub details: Option<&'a GameDetails>,
}

#[derive(Debug, Serialize)]
pub struct NewScoreRow<'a> {
    pub game_id: &'a str,
    pub participant_id: &'a str,
    pub score: i32,
}

#[derive(Debug, Serialize)]
pub struct RenameRow<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_premium: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipantRow {
    pub id: String,
    pub name: String,
}

impl From<ParticipantRow> for RemoteParticipant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionRow {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Session listing row with its participants embedded.
#[derive(Debug, Deserialize)]
pub struct SessionListRow {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub session_participants: Option<Vec<ParticipantRow>>,
}

impl From<SessionListRow> for RemoteSessionSummary {
    fn from(row: SessionListRow) -> Self {
        Self {
            id: row.id,
            created_at: SystemTime::from(row.created_at),
            participants: row
                .session_participants
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoreRow {
    pub participant_id: String,
    pub score: i32,
}

/// Game row with its scores embedded.
#[derive(Debug, Deserialize)]
pub struct GameRow {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub game_scores: Option<Vec<ScoreRow>>,
}

impl From<GameRow> for RemoteGame {
    fn from(row: GameRow) -> Self {
        // Details are free-form JSON remotely; keep the game even when they do not parse.
        let details = row
            .details
            .filter(|value| !value.is_null())
            .and_then(|value| match serde_json::from_value::<GameDetails>(value) {
                Ok(details) => Some(details),
                Err(err) => {
                    warn!(game_id = %row.id, error = %err, "ignoring unreadable game details");
                    None
                }
            });

        Self {
            id: row.id,
            created_at: SystemTime::from(row.created_at),
            details,
            scores: row
                .game_scores
                .unwrap_or_default()
                .into_iter()
                .map(|score| RemoteScore {
                    participant_id: score.participant_id,
                    score: score.score,
                })
                .collect(),
        }
    }
}

/// Assemble the full session view from its three independent fetches.
pub fn full_session(
    session: SessionRow,
    participants: Vec<ParticipantRow>,
    games: Vec<GameRow>,
) -> RemoteSessionFull {
    RemoteSessionFull {
        id: session.id,
        created_at: SystemTime::from(session.created_at),
        participants: participants.into_iter().map(Into::into).collect(),
        games: games.into_iter().map(Into::into).collect(),
    }
}

/// PostgREST `in.(…)` filter value, quoting every item.
pub fn in_filter<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let quoted = values
        .into_iter()
        .map(|value| format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({quoted})")
}
