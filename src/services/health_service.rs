use tracing::warn;

use crate::{
    dao::local_store::SESSIONS_KEY,
    dto::health::{HealthResponse, RemoteStatus},
    state::SharedState,
};

/// Check local storage and the remote backend, logging whatever fails.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let local_ok = match state.local_store().read_raw(SESSIONS_KEY) {
        Ok(_) => true,
        Err(err) => {
            warn!(error = %err, "local storage health check failed");
            false
        }
    };

    let remote = match state.remote().await {
        Some(gateway) => match gateway.health_check().await {
            Ok(()) => RemoteStatus::Connected,
            Err(err) => {
                warn!(error = %err, "remote health check failed");
                RemoteStatus::Unreachable
            }
        },
        None => RemoteStatus::LocalOnly,
    };

    if local_ok && remote != RemoteStatus::Unreachable {
        HealthResponse::ok(remote)
    } else {
        HealthResponse::degraded(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{local_state, remote_state};

    #[tokio::test]
    async fn local_only_is_healthy() {
        let (state, _) = local_state();
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.remote, RemoteStatus::LocalOnly);
    }

    #[tokio::test]
    async fn disabled_storage_degrades() {
        let (state, backend) = local_state();
        backend.set_disabled(true);
        assert_eq!(health_status(&state).await.status, "degraded");
    }

    #[tokio::test]
    async fn unreachable_remote_degrades() {
        let (state, gateway) = remote_state().await;
        assert_eq!(health_status(&state).await.remote, RemoteStatus::Connected);
        gateway.set_failing(true);
        let health = health_status(&state).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.remote, RemoteStatus::Unreachable);
    }
}
