//! Library crate for tarot-tracker, exposing modules for binaries and integration tests.

/// Runtime configuration loaded at startup.
pub mod config;
/// Local and remote persistence.
pub mod dao;
mod dto;
mod error;
/// HTTP routes.
pub mod routes;
/// Operations behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
