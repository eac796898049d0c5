use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        billing::{BillingStatus, SetPremiumRequest},
        common::SyncResponse,
    },
    error::AppError,
    services::billing_service,
    state::SharedState,
};

/// Premium entitlement and the free-tier session quota.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/billing", get(billing_status).put(set_premium))
        .route("/billing/refresh", post(refresh_entitlement))
}

async fn status(state: &SharedState) -> BillingStatus {
    let premium = billing_service::is_premium(state);
    let sessions_used = state.read_sessions(|snapshot| snapshot.sessions.len()).await;
    BillingStatus {
        premium,
        session_limit: (!premium).then_some(state.options().session_limit),
        sessions_used,
    }
}

#[utoipa::path(
    get,
    path = "/billing",
    tag = "billing",
    responses((status = 200, description = "Current entitlement", body = BillingStatus))
)]
pub async fn billing_status(State(state): State<SharedState>) -> Json<BillingStatus> {
    Json(status(&state).await)
}

/// Reload the premium flag from the backend profile.
#[utoipa::path(
    post,
    path = "/billing/refresh",
    tag = "billing",
    responses((status = 200, description = "Refreshed entitlement", body = BillingStatus))
)]
pub async fn refresh_entitlement(State(state): State<SharedState>) -> Json<BillingStatus> {
    billing_service::refresh_entitlement(&state).await;
    Json(status(&state).await)
}

/// Developer toggle of the premium flag. Requires a signed-in backend user.
#[utoipa::path(
    put,
    path = "/billing",
    tag = "billing",
    request_body = SetPremiumRequest,
    responses(
        (status = 200, description = "Flag stored", body = SyncResponse<bool>),
        (status = 401, description = "No signed-in user"),
        (status = 503, description = "Running local-only")
    )
)]
pub async fn set_premium(
    State(state): State<SharedState>,
    Json(payload): Json<SetPremiumRequest>,
) -> Result<Json<SyncResponse<bool>>, AppError> {
    let outcome = billing_service::set_premium_dev(&state, payload.enabled).await?;
    Ok(Json(SyncResponse::from_outcome(outcome)))
}
