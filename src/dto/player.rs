use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_player_name;

/// Every known player name.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayersResponse {
    pub players: Vec<String>,
}

/// New name for a player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RenamePlayerRequest {
    #[validate(custom(function = "validate_player_name"))]
    pub new_name: String,
}
