//! Supabase-hosted provider client.
//!
//! DESIGN
//! ======
//! Thin HTTP wrapper over the hosted project's auth REST endpoints
//! (`/auth/v1/*`) and table REST endpoints (`/rest/v1/*`). Pure parsing in
//! the `parse_*` helpers for testability.
//!
//! The session-change stream is client-local, as in the hosted SDK: this
//! client emits an event whenever one of its own calls transitions the
//! session. The current session is the only piece of state it holds.

use std::time::Duration;

use tokio::sync::{RwLock, broadcast};

use super::config::ProviderConfig;
use super::types::{
    AuthProvider, AuthUser, ProviderError, Session, SessionChange, SessionEvent, UsernameMapping,
};

/// Table holding username -> email login mappings.
pub const MAPPING_TABLE: &str = "user_login_mapping";

const EVENT_CHANNEL_CAPACITY: usize = 16;

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseClient {
    /// Build a client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ProviderError::HttpClientBuild(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            http,
            base_url: config.base_url,
            anon_key: config.anon_key,
            session: RwLock::new(None),
            events,
        })
    }

    /// Build a client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required env vars are missing or the HTTP client
    /// fails to build.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(ProviderConfig::from_env()?)
    }

    async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Replace the held session and notify subscribers.
    async fn replace_session(&self, next: Option<Session>, change: SessionChange) {
        let mut guard = self.session.write().await;
        *guard = next.clone();
        drop(guard);
        // send fails only when no subscriber is listening.
        let _ = self.events.send(SessionEvent { change, session: next });
    }

    async fn auth_token_request(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let url = format!("{}/auth/v1/{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordBody { email, password })
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if matches!(status, 400 | 401 | 403 | 422) {
            return Err(ProviderError::AuthRejected { message: parse_auth_error_message(&text) });
        }
        if status != 200 {
            return Err(ProviderError::ApiResponse { status, body: text });
        }

        let session = parse_session(&text)?;
        self.replace_session(Some(session.clone()), SessionChange::SignedIn)
            .await;
        Ok(session)
    }
}

#[async_trait::async_trait]
impl AuthProvider for SupabaseClient {
    async fn get_current_user(&self) -> Result<Option<AuthUser>, ProviderError> {
        let Some(token) = self.access_token().await else {
            return Ok(None);
        };

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        // An expired or revoked token means "no current user", not a failure.
        if status == 401 {
            return Ok(None);
        }
        if status != 200 {
            return Err(ProviderError::ApiResponse { status, body: text });
        }

        parse_user(&text).map(Some)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        self.auth_token_request("token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        self.auth_token_request("signup", email, password).await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Some(token) = self.access_token().await {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let response = self
                .http
                .post(&url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::ApiResponse { status, body });
            }
        }

        self.replace_session(None, SessionChange::SignedOut).await;
        Ok(())
    }

    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn select_mapping(&self, username: &str) -> Result<UsernameMapping, ProviderError> {
        let url = format!("{}/rest/v1/{MAPPING_TABLE}", self.base_url);
        let filter = format!("eq.{username}");
        let response = self
            .http
            .get(&url)
            .query(&[("select", "user_id,username,email"), ("username", filter.as_str())])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            // Single-object mode: non-200 unless exactly one row matches.
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let (status, text) = read_body(response).await?;
        if status == 406 {
            return Err(ProviderError::NoRow);
        }
        if status != 200 {
            return Err(ProviderError::ApiResponse { status, body: text });
        }

        parse_mapping(&text)
    }

    async fn insert_mapping(&self, mapping: &UsernameMapping) -> Result<(), ProviderError> {
        let url = format!("{}/rest/v1/{MAPPING_TABLE}", self.base_url);
        // Inserts run right after registration, so a user token is normally
        // held; fall back to the anon key otherwise and let row-level
        // security decide.
        let bearer = self
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&bearer)
            .header("Prefer", "return=minimal")
            .json(mapping)
            .send()
            .await
            .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiResponse { status, body });
        }
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct PasswordBody<'a> {
    email: &'a str,
    password: &'a str,
}

// =============================================================================
// PARSING
// =============================================================================

async fn read_body(response: reqwest::Response) -> Result<(u16, String), ProviderError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ProviderError::ApiRequest(e.to_string()))?;
    Ok((status, text))
}

fn parse_session(json: &str) -> Result<Session, ProviderError> {
    serde_json::from_str(json).map_err(|e| ProviderError::ApiParse(e.to_string()))
}

fn parse_user(json: &str) -> Result<AuthUser, ProviderError> {
    serde_json::from_str(json).map_err(|e| ProviderError::ApiParse(e.to_string()))
}

fn parse_mapping(json: &str) -> Result<UsernameMapping, ProviderError> {
    serde_json::from_str(json).map_err(|e| ProviderError::ApiParse(e.to_string()))
}

/// Extract a human-readable message from an auth error body. The auth API has
/// used `error_description`, `msg`, and `error` across versions.
fn parse_auth_error_message(json: &str) -> String {
    #[derive(serde::Deserialize)]
    struct AuthErrorBody {
        error_description: Option<String>,
        msg: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<AuthErrorBody>(json)
        .ok()
        .and_then(|b| b.error_description.or(b.msg).or(b.error))
        .unwrap_or_else(|| "invalid credentials".to_owned())
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
