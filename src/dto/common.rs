use serde::Serialize;
use utoipa::ToSchema;

use crate::services::outcome::{RemoteSync, SyncOutcome};

/// Remote effect of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RemoteSyncStatus {
    Applied,
    Failed,
    NotAttempted,
}

impl From<RemoteSync> for RemoteSyncStatus {
    fn from(value: RemoteSync) -> Self {
        match value {
            RemoteSync::Applied => RemoteSyncStatus::Applied,
            RemoteSync::Failed => RemoteSyncStatus::Failed,
            RemoteSync::NotAttempted => RemoteSyncStatus::NotAttempted,
        }
    }
}

/// Mutation result: the value, whether local state changed and what the backend did.
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse<T> {
    pub value: T,
    pub applied_locally: bool,
    pub remote: RemoteSyncStatus,
}

impl<T> SyncResponse<T> {
    /// Convert a service outcome, mapping its value into its DTO.
    pub fn from_outcome<U>(outcome: SyncOutcome<U>) -> Self
    where
        U: Into<T>,
    {
        Self {
            value: outcome.value.into(),
            applied_locally: outcome.applied_locally,
            remote: outcome.remote.into(),
        }
    }
}
