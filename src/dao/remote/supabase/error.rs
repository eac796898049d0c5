//! Error types shared by the Supabase gateway implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`SupabaseError`] failures.
pub type SupabaseResult<T> = Result<T, SupabaseError>;

/// Failures that can occur while talking to the Supabase REST API.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Required environment variable is missing.
    #[error("missing Supabase environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Supabase client")]
    ClientBuilder {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// No authenticated caller is available for the operation.
    #[error("no authenticated Supabase user")]
    NotAuthenticated,
    /// A request to a table endpoint could not be sent.
    #[error("failed to send Supabase request to `{table}`")]
    RequestSend {
        /// Target table.
        table: &'static str,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// PostgREST answered with a non-success status code.
    #[error("unexpected Supabase response status {status} for `{table}`: {body}")]
    RequestStatus {
        /// Target table.
        table: &'static str,
        /// Status returned by PostgREST.
        status: StatusCode,
        /// Response body, usually a PostgREST error object.
        body: String,
    },
    /// Response payload could not be decoded into the expected rows.
    #[error("failed to decode Supabase response for `{table}`")]
    DecodeResponse {
        /// Target table.
        table: &'static str,
        /// Decoding failure.
        #[source]
        source: reqwest::Error,
    },
    /// A request that must return exactly one row returned none.
    #[error("Supabase returned no row for `{table}`")]
    MissingRow {
        /// Target table.
        table: &'static str,
    },
}

impl From<SupabaseError> for StorageError {
    fn from(err: SupabaseError) -> Self {
        StorageError::unavailable("supabase request failed".into(), err)
    }
}
