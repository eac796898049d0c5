use crate::dao::remote::Identity;

use super::error::{SupabaseError, SupabaseResult};

/// Runtime configuration describing how to reach the Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, without the `/rest/v1` suffix.
    pub base_url: String,
    /// Public API key sent as `apikey`.
    pub anon_key: String,
    /// Identity to start with, when the caller was authenticated out of band.
    pub identity: Option<Identity>,
}

impl SupabaseConfig {
    /// Construct a configuration from the project URL and its public API key.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            identity: None,
        }
    }

    /// Attach an already resolved caller identity.
    pub fn with_identity(
        mut self,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        self.identity = Some(Identity {
            user_id: user_id.into(),
            access_token: access_token.into(),
        });
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        let base_url = std::env::var("SUPABASE_URL").map_err(|_| SupabaseError::MissingEnvVar {
            var: "SUPABASE_URL",
        })?;
        let anon_key =
            std::env::var("SUPABASE_ANON_KEY").map_err(|_| SupabaseError::MissingEnvVar {
                var: "SUPABASE_ANON_KEY",
            })?;

        let mut config = Self::new(base_url, anon_key);

        if let (Some(user_id), Some(token)) = (
            std::env::var("SUPABASE_USER_ID").ok(),
            std::env::var("SUPABASE_ACCESS_TOKEN").ok(),
        ) {
            config = config.with_identity(user_id, token);
        }

        Ok(config)
    }
}
