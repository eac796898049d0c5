use tracing::info;

use crate::{
    dao::remote::Identity, error::ServiceError, services::billing_service, state::SharedState,
};

/// Use `identity` for subsequent remote calls and reload the entitlement.
pub async fn sign_in(state: &SharedState, identity: Identity) -> Result<bool, ServiceError> {
    let gateway = state.remote().await.ok_or(ServiceError::LocalOnly)?;
    info!(user_id = %identity.user_id, "signed in");
    gateway.set_identity(Some(identity));
    Ok(billing_service::refresh_entitlement(state).await)
}

/// Forget the current identity. Remote calls return their sentinels until the next sign-in.
pub async fn sign_out(state: &SharedState) {
    if let Some(gateway) = state.remote().await {
        gateway.set_identity(None);
    }
    billing_service::refresh_entitlement(state).await;
    info!("signed out");
}

/// User id of the current identity, if any.
pub async fn current_user(state: &SharedState) -> Option<String> {
    let gateway = state.remote().await?;
    gateway.identity().map(|identity| identity.user_id)
}
