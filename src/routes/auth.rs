use axum::{Json, Router, extract::State, routing::put};
use axum_valid::Valid;

use crate::{
    dto::auth::{AuthStatus, SignInRequest},
    error::AppError,
    services::{auth_service, billing_service},
    state::SharedState,
};

/// Backend identity of the current user.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route(
        "/auth/session",
        put(sign_in).get(auth_status).delete(sign_out),
    )
}

async fn status(state: &SharedState) -> AuthStatus {
    let user_id = auth_service::current_user(state).await;
    AuthStatus {
        signed_in: user_id.is_some(),
        user_id,
        premium: billing_service::is_premium(state),
    }
}

#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "auth",
    responses((status = 200, description = "Current identity", body = AuthStatus))
)]
pub async fn auth_status(State(state): State<SharedState>) -> Json<AuthStatus> {
    Json(status(&state).await)
}

/// Attach a backend identity and reload the entitlement.
#[utoipa::path(
    put,
    path = "/auth/session",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthStatus),
        (status = 400, description = "Empty user id or token"),
        (status = 503, description = "Running local-only")
    )
)]
pub async fn sign_in(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SignInRequest>>,
) -> Result<Json<AuthStatus>, AppError> {
    auth_service::sign_in(&state, payload.into()).await?;
    Ok(Json(status(&state).await))
}

#[utoipa::path(
    delete,
    path = "/auth/session",
    tag = "auth",
    responses((status = 200, description = "Signed out", body = AuthStatus))
)]
pub async fn sign_out(State(state): State<SharedState>) -> Json<AuthStatus> {
    auth_service::sign_out(&state).await;
    Json(status(&state).await)
}
