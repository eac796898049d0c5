//! Tarot Tracker binary entrypoint wiring the REST API, the SSE change feed and storage layers.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tarot_tracker::{
    config::AppConfig,
    dao::local_store::LocalStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let local = LocalStore::new(config.kv_backend());
    let app_state = AppState::new(local, config.store_options());

    connect_remote(&app_state).await?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the Supabase gateway when the environment describes a project.
///
/// Missing variables leave the application local-only.
#[cfg(feature = "supabase-remote")]
async fn connect_remote(state: &SharedState) -> anyhow::Result<()> {
    use std::sync::Arc;

    use tarot_tracker::{
        dao::remote::supabase::{SupabaseConfig, SupabaseGateway, error::SupabaseError},
        services::{billing_service, session_service},
    };

    let supabase = match SupabaseConfig::from_env() {
        Ok(supabase) => supabase,
        Err(SupabaseError::MissingEnvVar { var }) => {
            info!(var, "Supabase not configured; running local-only");
            return Ok(());
        }
        Err(err) => return Err(err).context("reading Supabase configuration"),
    };
    let signed_in = supabase.identity.is_some();

    let gateway = SupabaseGateway::connect(supabase).context("building Supabase client")?;
    state.install_remote(Arc::new(gateway)).await;
    let premium = billing_service::refresh_entitlement(state).await;
    info!(signed_in, premium, "connected to Supabase");

    if signed_in {
        let state = state.clone();
        tokio::spawn(async move {
            let report = session_service::sync_unsynced(&state).await;
            info!(
                linked = report.sessions_linked,
                pushed = report.games_pushed,
                failed = report.sessions_failed,
                "startup sync finished"
            );
        });
    }

    Ok(())
}

#[cfg(not(feature = "supabase-remote"))]
async fn connect_remote(_state: &SharedState) -> anyhow::Result<()> {
    info!("built without remote support; running local-only");
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
