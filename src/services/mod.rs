/// Sign-in and sign-out of the remote identity.
pub mod auth_service;
/// Premium entitlement refresh and developer toggle.
pub mod billing_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Result types describing the local and remote effect of a mutation.
pub mod outcome;
/// Player rename and removal across sessions.
pub mod player_service;
/// Deal scoring rules.
pub mod scoring;
/// Session and game lifecycle, remote import and sync.
pub mod session_service;
/// Read and write user settings.
pub mod settings_service;
/// Server-Sent Events streaming of the change feed.
pub mod sse_service;
