use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    dao::models::{GameDetails, GameEntity},
    dto::format_system_time,
};

/// Longest accepted free-form note on a game.
pub const MAX_NOTE_LENGTH: u64 = 500;

/// Game appended to a session. Scores are computed from `details` when omitted.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_add_game"))]
pub struct AddGameRequest {
    #[serde(default)]
    pub scores: Option<IndexMap<String, i32>>,
    #[serde(default)]
    #[validate(length(max = MAX_NOTE_LENGTH))]
    pub note: Option<String>,
    #[serde(default)]
    pub details: Option<GameDetails>,
}

fn validate_add_game(request: &AddGameRequest) -> Result<(), ValidationError> {
    if request.scores.is_none() && request.details.is_none() {
        let mut err = ValidationError::new("game_without_scores");
        err.message = Some("Either scores or details must be provided".into());
        return Err(err);
    }
    Ok(())
}

/// Replacement scores, and optionally details, for an existing game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateGameRequest {
    pub scores: IndexMap<String, i32>,
    #[serde(default)]
    pub details: Option<GameDetails>,
}

/// Game as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameView {
    pub id: String,
    /// RFC 3339 time the game was recorded.
    pub timestamp: String,
    pub scores: IndexMap<String, i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<GameDetails>,
    /// Whether the backend has not acknowledged the game yet.
    pub pending_remote: bool,
}

impl From<GameEntity> for GameView {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            timestamp: format_system_time(game.timestamp),
            scores: game.scores,
            note: game.note,
            details: game.details,
            pending_remote: game.pending_remote,
        }
    }
}
