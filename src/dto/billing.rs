use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Entitlement of the current user.
#[derive(Debug, Serialize, ToSchema)]
pub struct BillingStatus {
    pub premium: bool,
    /// Maximum number of sessions, absent for premium users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_limit: Option<usize>,
    pub sessions_used: usize,
}

/// Developer toggle of the premium flag.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPremiumRequest {
    pub enabled: bool,
}
