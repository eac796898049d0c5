use axum::Router;

use crate::state::SharedState;

/// Remote identity.
pub mod auth;
/// Premium entitlement.
pub mod billing;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Health check.
pub mod health;
/// Known players, rename and removal.
pub mod players;
/// Backend sessions, import and sync.
pub mod remote;
/// Local sessions and games.
pub mod sessions;
/// User settings.
pub mod settings;
/// Server-sent change feed.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(sessions::router())
        .merge(remote::router())
        .merge(players::router())
        .merge(settings::router())
        .merge(billing::router())
        .merge(auth::router());

    api_router.merge(docs::router()).with_state(state)
}
