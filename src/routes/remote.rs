use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::{
        player::PlayersResponse,
        session::{ImportResponse, RemoteSessionLink, SyncReportResponse},
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Backend mirroring: import remote sessions and push local ones.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/remote/sessions", get(list_remote_sessions))
        .route(
            "/remote/sessions/{remote_id}/participants",
            get(remote_participants),
        )
        .route("/remote/sessions/{remote_id}/import", post(import_session))
        .route("/sync", post(sync_unsynced))
}

/// Mirror every remote session locally and list the links, newest first.
#[utoipa::path(
    get,
    path = "/remote/sessions",
    tag = "remote",
    responses((status = 200, description = "Remote sessions with their local counterpart", body = [RemoteSessionLink]))
)]
pub async fn list_remote_sessions(State(state): State<SharedState>) -> Json<Vec<RemoteSessionLink>> {
    let linked = session_service::list_remote_into_local(&state).await;
    Json(linked.into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/remote/sessions/{remote_id}/participants",
    tag = "remote",
    params(("remote_id" = String, Path, description = "Backend session identifier")),
    responses((status = 200, description = "Participant names, empty when unavailable", body = PlayersResponse))
)]
pub async fn remote_participants(
    State(state): State<SharedState>,
    Path(remote_id): Path<String>,
) -> Json<PlayersResponse> {
    Json(PlayersResponse {
        players: session_service::remote_participants(&state, &remote_id).await,
    })
}

#[utoipa::path(
    post,
    path = "/remote/sessions/{remote_id}/import",
    tag = "remote",
    params(("remote_id" = String, Path, description = "Backend session identifier")),
    responses(
        (status = 200, description = "Local id of the mirrored session", body = ImportResponse),
        (status = 404, description = "Session unavailable remotely")
    )
)]
/// Import one remote session, reusing the local copy when there is one.
pub async fn import_session(
    State(state): State<SharedState>,
    Path(remote_id): Path<String>,
) -> Result<Json<ImportResponse>, AppError> {
    let local_id = session_service::ensure_local_from_remote(&state, &remote_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("remote session `{remote_id}` unavailable")))?;
    Ok(Json(ImportResponse { local_id }))
}

#[utoipa::path(
    post,
    path = "/sync",
    tag = "remote",
    responses((status = 200, description = "Counters of the sync run", body = SyncReportResponse))
)]
/// Push local-only sessions and pending games to the backend.
pub async fn sync_unsynced(State(state): State<SharedState>) -> Json<SyncReportResponse> {
    Json(session_service::sync_unsynced(&state).await.into())
}
