use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        common::SyncResponse,
        game::{AddGameRequest, GameView, UpdateGameRequest},
        session::{CreateSessionRequest, SessionDetail, SessionSummary, TotalsResponse},
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

fn session_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("session `{id}` not found"))
}

/// Local sessions and their games.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/totals", get(session_totals))
        .route("/sessions/{id}/games", post(add_game))
        .route(
            "/sessions/{id}/games/{game_id}",
            put(update_game).delete(remove_game),
        )
}

/// List every local session.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    responses((status = 200, description = "Local sessions in creation order", body = [SessionSummary]))
)]
pub async fn list_sessions(State(state): State<SharedState>) -> Json<Vec<SessionSummary>> {
    let sessions = session_service::all_sessions(&state).await;
    Json(sessions.into_iter().map(Into::into).collect())
}

/// Create a session, linking it remotely when the backend accepts it.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SyncResponse<SessionDetail>),
        (status = 400, description = "No usable participant name"),
        (status = 402, description = "Free-tier session limit reached")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<Json<SyncResponse<SessionDetail>>, AppError> {
    let outcome = session_service::create_session(&state, payload.participants).await?;
    Ok(Json(SyncResponse::from_outcome(outcome)))
}

/// Retrieve a session with its games.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Local session identifier")),
    responses(
        (status = 200, description = "Session", body = SessionDetail),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, AppError> {
    let session = session_service::get_session(&state, &id)
        .await
        .ok_or_else(|| session_not_found(&id))?;
    Ok(Json(session.into()))
}

/// Delete a session locally, then remotely when it is linked.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Local session identifier")),
    responses(
        (status = 200, description = "Session deleted", body = SyncResponse<bool>),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SyncResponse<bool>>, AppError> {
    let outcome = session_service::delete_session(&state, &id).await;
    if !outcome.applied_locally {
        return Err(session_not_found(&id));
    }
    Ok(Json(SyncResponse::from_outcome(outcome)))
}

/// Accumulated points per player of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/totals",
    tag = "sessions",
    params(("id" = String, Path, description = "Local session identifier")),
    responses(
        (status = 200, description = "Totals per player", body = TotalsResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn session_totals(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<TotalsResponse>, AppError> {
    let session = session_service::get_session(&state, &id)
        .await
        .ok_or_else(|| session_not_found(&id))?;
    Ok(Json(TotalsResponse {
        totals: session_service::compute_totals(&session),
        session_id: session.id,
    }))
}

/// Record a game. Scores are computed from the details when not provided.
#[utoipa::path(
    post,
    path = "/sessions/{id}/games",
    tag = "games",
    params(("id" = String, Path, description = "Local session identifier")),
    request_body = AddGameRequest,
    responses(
        (status = 200, description = "Game recorded", body = SyncResponse<GameView>),
        (status = 400, description = "Details cannot be scored"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn add_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<AddGameRequest>>,
) -> Result<Json<SyncResponse<GameView>>, AppError> {
    let outcome = session_service::record_game(
        &state,
        &id,
        payload.scores,
        payload.note,
        payload.details,
    )
    .await?;
    Ok(Json(SyncResponse::from_outcome(outcome)))
}

/// Replace the scores of a game. Local only.
#[utoipa::path(
    put,
    path = "/sessions/{id}/games/{game_id}",
    tag = "games",
    params(
        ("id" = String, Path, description = "Local session identifier"),
        ("game_id" = String, Path, description = "Game identifier")
    ),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Game updated", body = GameView),
        (status = 404, description = "Unknown session or game")
    )
)]
pub async fn update_game(
    State(state): State<SharedState>,
    Path((id, game_id)): Path<(String, String)>,
    Valid(Json(payload)): Valid<Json<UpdateGameRequest>>,
) -> Result<Json<GameView>, AppError> {
    let game =
        session_service::update_game(&state, &id, &game_id, payload.scores, payload.details)
            .await
            .ok_or_else(|| AppError::NotFound(format!("game `{game_id}` not found")))?;
    Ok(Json(game.into()))
}

/// Remove a game. Local only.
#[utoipa::path(
    delete,
    path = "/sessions/{id}/games/{game_id}",
    tag = "games",
    params(
        ("id" = String, Path, description = "Local session identifier"),
        ("game_id" = String, Path, description = "Game identifier")
    ),
    responses(
        (status = 204, description = "Game removed"),
        (status = 404, description = "Unknown session or game")
    )
)]
pub async fn remove_game(
    State(state): State<SharedState>,
    Path((id, game_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    if session_service::remove_game(&state, &id, &game_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("game `{game_id}` not found")))
    }
}
