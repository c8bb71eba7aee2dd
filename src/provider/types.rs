//! Provider types — backend-neutral auth/session types and errors.
//!
//! Shared by the hosted Supabase client and by anything that needs to fake
//! the provider in tests.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A required environment variable is not set.
    #[error("missing provider config: env var {var} not set")]
    MissingEnv { var: String },

    /// The provider rejected the supplied credentials.
    #[error("authentication rejected: {message}")]
    AuthRejected { message: String },

    /// The HTTP request to the provider failed before a response arrived.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// A single-row lookup matched no row.
    #[error("single-row lookup matched no row")]
    NoRow,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// AUTH TYPES
// =============================================================================

/// The provider's record for an authenticated user (subset actually consumed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// An authenticated session as issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// One username -> email row in the `user_login_mapping` table.
///
/// Created once at registration time, read at every non-email login attempt.
/// Uniqueness of `username` is enforced by the storage layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameMapping {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

// =============================================================================
// SESSION EVENTS
// =============================================================================

/// Kind of session transition pushed on the session-change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionChange {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// One notification on the session-change stream. A `None` session means the
/// user is signed out.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub change: SessionChange,
    pub session: Option<Session>,
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Backend-neutral async trait for the hosted auth & data provider.
/// Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Fetch the user behind the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the provider cannot be reached or
    /// responds with an unexpected payload.
    async fn get_current_user(&self) -> Result<Option<AuthUser>, ProviderError>;

    /// Sign in with an email address and password.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AuthRejected`] when the credentials are
    /// refused, or another [`ProviderError`] on transport/parse failure.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError>;

    /// Create a new auth account.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AuthRejected`] when the provider refuses the
    /// registration, or another [`ProviderError`] on transport/parse failure.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the provider call fails; the session is
    /// kept in that case so the caller can retry.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Subscribe to session-change notifications. Dropping the receiver
    /// releases the subscription.
    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionEvent>;

    /// Look up the login mapping for `username`. Exact match, single row.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NoRow`] when no mapping exists, or another
    /// [`ProviderError`] on transport/parse failure.
    async fn select_mapping(&self, username: &str) -> Result<UsernameMapping, ProviderError>;

    /// Insert one login-mapping row. Duplicate usernames are rejected by the
    /// storage layer's uniqueness constraint.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the insert is rejected or the provider
    /// cannot be reached.
    async fn insert_mapping(&self, mapping: &UsernameMapping) -> Result<(), ProviderError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
