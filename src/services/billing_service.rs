use tracing::{info, warn};

use crate::{
    error::ServiceError,
    services::outcome::{RemoteSync, SyncOutcome},
    state::{SharedState, StoreEvent},
};

/// Cached premium flag.
pub fn is_premium(state: &SharedState) -> bool {
    state.entitlement().is_premium()
}

fn publish_if_changed(state: &SharedState, premium: bool) {
    if state.entitlement().set(premium) {
        info!(premium, "entitlement changed");
        state
            .events()
            .publish(StoreEvent::EntitlementChanged { premium });
    }
}

/// Reload the premium flag from the caller's profile.
///
/// Local-only mode and any remote failure count as the free tier.
pub async fn refresh_entitlement(state: &SharedState) -> bool {
    let premium = match state.remote().await {
        Some(gateway) => gateway.load_premium().await,
        None => false,
    };
    publish_if_changed(state, premium);
    premium
}

/// Developer toggle writing the premium flag straight into the profile row.
pub async fn set_premium_dev(
    state: &SharedState,
    enabled: bool,
) -> Result<SyncOutcome<bool>, ServiceError> {
    let gateway = state.remote().await.ok_or(ServiceError::LocalOnly)?;
    if gateway.identity().is_none() {
        return Err(ServiceError::Unauthenticated);
    }

    if !gateway.store_premium(enabled).await {
        warn!(enabled, "premium flag was not stored");
        return Ok(SyncOutcome::new(
            is_premium(state),
            false,
            RemoteSync::Failed,
        ));
    }

    publish_if_changed(state, enabled);
    Ok(SyncOutcome::new(enabled, true, RemoteSync::Applied))
}
