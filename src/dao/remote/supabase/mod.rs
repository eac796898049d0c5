mod config;
/// Errors raised while configuring or building the client.
pub mod error;
mod gateway;
mod models;

pub use config::SupabaseConfig;
pub use gateway::SupabaseGateway;
