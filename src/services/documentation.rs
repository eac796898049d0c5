use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Tarot Tracker.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::events_stream,
        crate::routes::sessions::list_sessions,
        crate::routes::sessions::create_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::delete_session,
        crate::routes::sessions::session_totals,
        crate::routes::sessions::add_game,
        crate::routes::sessions::update_game,
        crate::routes::sessions::remove_game,
        crate::routes::remote::list_remote_sessions,
        crate::routes::remote::remote_participants,
        crate::routes::remote::import_session,
        crate::routes::remote::sync_unsynced,
        crate::routes::players::list_players,
        crate::routes::players::rename_player,
        crate::routes::players::delete_player,
        crate::routes::settings::get_score_config,
        crate::routes::settings::put_score_config,
        crate::routes::settings::get_misery,
        crate::routes::settings::put_misery,
        crate::routes::settings::get_theme,
        crate::routes::settings::put_theme,
        crate::routes::billing::billing_status,
        crate::routes::billing::set_premium,
        crate::routes::billing::refresh_entitlement,
        crate::routes::auth::auth_status,
        crate::routes::auth::sign_in,
        crate::routes::auth::sign_out,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::RemoteStatus,
            crate::dto::common::RemoteSyncStatus,
            crate::dto::sse::Handshake,
            crate::dto::session::SessionSummary,
            crate::dto::session::SessionDetail,
            crate::dto::game::GameView,
            crate::dao::models::GameDetails,
            crate::dao::models::Contract,
            crate::dao::models::Bout,
            crate::dao::models::PetitAuBout,
            crate::dao::models::Poignee,
            crate::dao::models::Chelem,
            crate::dao::settings::ScoreConfig,
            crate::dao::settings::MiserySettings,
            crate::dao::settings::ThemeMode,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "events", description = "Server-sent change feed"),
        (name = "sessions", description = "Local sessions"),
        (name = "games", description = "Games within a session"),
        (name = "remote", description = "Backend import and sync"),
        (name = "players", description = "Player names across sessions"),
        (name = "settings", description = "Scoring and display preferences"),
        (name = "billing", description = "Premium entitlement"),
        (name = "auth", description = "Backend identity"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_tree() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/events",
            "/sessions/{id}/games/{game_id}",
            "/remote/sessions/{remote_id}/import",
            "/players/{name}",
            "/settings/score-config",
            "/billing/refresh",
            "/auth/session",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
