use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        common::SyncResponse,
        player::{PlayersResponse, RenamePlayerRequest},
    },
    services::player_service,
    state::SharedState,
};

/// Player names across sessions.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/players", get(list_players))
        .route("/players/{name}", put(rename_player).delete(delete_player))
}

#[utoipa::path(
    get,
    path = "/players",
    tag = "players",
    responses((status = 200, description = "Known players", body = PlayersResponse))
)]
pub async fn list_players(State(state): State<SharedState>) -> Json<PlayersResponse> {
    Json(PlayersResponse {
        players: player_service::known_players(&state).await,
    })
}

/// Rename a player everywhere. The value counts the local sessions touched.
#[utoipa::path(
    put,
    path = "/players/{name}",
    tag = "players",
    params(("name" = String, Path, description = "Current player name")),
    request_body = RenamePlayerRequest,
    responses(
        (status = 200, description = "Rename applied", body = SyncResponse<usize>),
        (status = 400, description = "Blank or oversized new name")
    )
)]
pub async fn rename_player(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Valid(Json(payload)): Valid<Json<RenamePlayerRequest>>,
) -> Json<SyncResponse<usize>> {
    let outcome = player_service::rename_player(&state, &name, &payload.new_name).await;
    Json(SyncResponse::from_outcome(outcome))
}

/// Remove a player from every session and game.
#[utoipa::path(
    delete,
    path = "/players/{name}",
    tag = "players",
    params(("name" = String, Path, description = "Player name")),
    responses((status = 200, description = "Player removed", body = SyncResponse<usize>))
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Json<SyncResponse<usize>> {
    let outcome = player_service::delete_player(&state, &name).await;
    Json(SyncResponse::from_outcome(outcome))
}
