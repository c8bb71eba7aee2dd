//! Provider configuration parsed from environment variables.

use super::types::ProviderError;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Project base URL, no trailing slash (e.g. `https://abc.supabase.co`).
    pub base_url: String,
    /// Public anon API key sent with every request.
    pub anon_key: String,
    pub timeouts: ProviderTimeouts,
}

impl ProviderConfig {
    /// Build typed provider config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `PROVIDER_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PROVIDER_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingEnv`] when a required variable is
    /// absent.
    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| ProviderError::MissingEnv { var: "SUPABASE_URL".into() })?
            .trim_end_matches('/')
            .to_string();
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| ProviderError::MissingEnv { var: "SUPABASE_ANON_KEY".into() })?;

        let timeouts = ProviderTimeouts {
            request_secs: env_parse_u64("PROVIDER_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("PROVIDER_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, anon_key, timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
