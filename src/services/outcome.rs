/// What happened to the remote mirror of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSync {
    /// The backend confirmed the change.
    Applied,
    /// The backend call was made and returned its failure sentinel.
    Failed,
    /// No call was made: local-only session, no gateway or nothing to mirror.
    NotAttempted,
}

impl RemoteSync {
    /// `Applied` or `Failed` from a gateway boolean sentinel.
    pub fn from_applied(applied: bool) -> Self {
        if applied {
            RemoteSync::Applied
        } else {
            RemoteSync::Failed
        }
    }
}

/// Result of a store mutation. The local part is committed before the remote call is made.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome<T> {
    /// Resulting value.
    pub value: T,
    /// Whether the local store changed.
    pub applied_locally: bool,
    /// Fate of the remote mirror.
    pub remote: RemoteSync,
}

impl<T> SyncOutcome<T> {
    /// Outcome from its parts.
    pub fn new(value: T, applied_locally: bool, remote: RemoteSync) -> Self {
        Self {
            value,
            applied_locally,
            remote,
        }
    }

    /// Mutation that was rejected or turned out to be a no-op.
    pub fn unchanged(value: T) -> Self {
        Self::new(value, false, RemoteSync::NotAttempted)
    }
}
