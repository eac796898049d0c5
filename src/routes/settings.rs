use axum::{Json, Router, extract::State, routing::get};
use serde_json::Value;

use crate::{
    dao::settings::{MiserySettings, ScoreConfig},
    dto::settings::ThemeBody,
    services::settings_service,
    state::SharedState,
};

/// User preferences persisted in the local store.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route(
            "/settings/score-config",
            get(get_score_config).put(put_score_config),
        )
        .route("/settings/misery", get(get_misery).put(put_misery))
        .route("/settings/theme", get(get_theme).put(put_theme))
}

#[utoipa::path(
    get,
    path = "/settings/score-config",
    tag = "settings",
    responses((status = 200, description = "Scoring constants", body = ScoreConfig))
)]
pub async fn get_score_config(State(state): State<SharedState>) -> Json<ScoreConfig> {
    Json(settings_service::score_config(&state))
}

/// Store scoring constants. Missing or invalid fields fall back to their default.
#[utoipa::path(
    put,
    path = "/settings/score-config",
    tag = "settings",
    request_body = ScoreConfig,
    responses((status = 200, description = "Stored scoring constants", body = ScoreConfig))
)]
pub async fn put_score_config(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> Json<ScoreConfig> {
    let config = ScoreConfig::from_value(&payload);
    Json(settings_service::set_score_config(&state, config))
}

#[utoipa::path(
    get,
    path = "/settings/misery",
    tag = "settings",
    responses((status = 200, description = "Misère toggles", body = MiserySettings))
)]
pub async fn get_misery(State(state): State<SharedState>) -> Json<MiserySettings> {
    Json(settings_service::misery(&state))
}

#[utoipa::path(
    put,
    path = "/settings/misery",
    tag = "settings",
    request_body = MiserySettings,
    responses((status = 200, description = "Stored misère toggles", body = MiserySettings))
)]
pub async fn put_misery(
    State(state): State<SharedState>,
    Json(payload): Json<MiserySettings>,
) -> Json<MiserySettings> {
    Json(settings_service::set_misery(&state, payload))
}

#[utoipa::path(
    get,
    path = "/settings/theme",
    tag = "settings",
    responses((status = 200, description = "Display theme", body = ThemeBody))
)]
pub async fn get_theme(State(state): State<SharedState>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: settings_service::theme(&state),
    })
}

#[utoipa::path(
    put,
    path = "/settings/theme",
    tag = "settings",
    request_body = ThemeBody,
    responses((status = 200, description = "Stored display theme", body = ThemeBody))
)]
pub async fn put_theme(
    State(state): State<SharedState>,
    Json(payload): Json<ThemeBody>,
) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: settings_service::set_theme(&state, payload.theme),
    })
}
