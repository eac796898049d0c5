use serde::Serialize;
use utoipa::ToSchema;

/// Reachability of the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Connected,
    Unreachable,
    /// No remote backend configured.
    LocalOnly,
}

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    pub remote: RemoteStatus,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(remote: RemoteStatus) -> Self {
        Self {
            status: "ok".to_string(),
            remote,
        }
    }

    /// Create a health response indicating storage or the backend is failing.
    pub fn degraded(remote: RemoteStatus) -> Self {
        Self {
            status: "degraded".to_string(),
            remote,
        }
    }
}
