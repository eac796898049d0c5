use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::remote::Identity;

/// Backend user and access token obtained by the client's own sign-in flow.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub access_token: String,
}

impl From<SignInRequest> for Identity {
    fn from(request: SignInRequest) -> Self {
        Self {
            user_id: request.user_id,
            access_token: request.access_token,
        }
    }
}

/// Current identity and entitlement.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthStatus {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub premium: bool,
}
