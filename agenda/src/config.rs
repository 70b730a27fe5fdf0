//! Runtime configuration read from the environment.
//!
//! A `.env` file next to the binary (or in the working directory) is loaded
//! first when present; real environment variables win over it.

use std::env;

pub const DEFAULT_AVATAR_BUCKET: &str = "avatars";
pub const DEFAULT_PASSWORD_RESET_REDIRECT: &str = "https://www.google.com";
pub const DEFAULT_REALTIME_CHANNEL: &str = "realtime-agendamentos";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing env var {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub avatar_bucket: String,
    pub password_reset_redirect: String,
    pub realtime_channel: String,
    /// Credentials for the binary's optional sign-in
    pub email: Option<String>,
    pub password: Option<String>,
}

impl AppConfig {
    /// Load `.env` if there is one, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(component = "config", path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            supabase_url: require("SUPABASE_URL")?,
            supabase_anon_key: require("SUPABASE_ANON_KEY")?,
            avatar_bucket: get("AVATAR_BUCKET").unwrap_or_else(|| DEFAULT_AVATAR_BUCKET.to_string()),
            password_reset_redirect: get("PASSWORD_RESET_REDIRECT")
                .unwrap_or_else(|| DEFAULT_PASSWORD_RESET_REDIRECT.to_string()),
            realtime_channel: get("REALTIME_CHANNEL")
                .unwrap_or_else(|| DEFAULT_REALTIME_CHANNEL.to_string()),
            email: get("AGENDA_EMAIL"),
            password: get("AGENDA_PASSWORD"),
        })
    }

    /// Config pointing at `url` with every optional value at its default
    pub fn for_backend(url: &str, anon_key: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            supabase_anon_key: anon_key.to_string(),
            avatar_bucket: DEFAULT_AVATAR_BUCKET.to_string(),
            password_reset_redirect: DEFAULT_PASSWORD_RESET_REDIRECT.to_string(),
            realtime_channel: DEFAULT_REALTIME_CHANNEL.to_string(),
            email: None,
            password: None,
        }
    }
}
