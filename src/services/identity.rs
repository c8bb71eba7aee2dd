//! Identity resolution — username-or-email login and mapping registration.
//!
//! DESIGN
//! ======
//! The login form accepts either an email address or a free-form username.
//! Usernames resolve to a canonical email through the `user_login_mapping`
//! table; when no mapping exists the synthetic fallback address is attempted
//! instead. The fallback covers accounts created before the mapping table
//! existed, so it must stay byte-identical across releases.

use uuid::Uuid;

use crate::provider::types::{AuthProvider, ProviderError, Session, UsernameMapping};

/// Fixed domain for synthesized login addresses. Not configurable: addresses
/// minted from it are already stored on the auth provider's side.
pub const FALLBACK_DOMAIN: &str = "realmbinder.local";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider refused the supplied credentials.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// The provider could not be reached or answered with garbage.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Resolve a user-entered identifier to the email address to attempt.
///
/// Identifiers containing `@` are treated as emails and returned unchanged
/// without touching the mapping table. Anything else is looked up by exact
/// username match; a missing or failed lookup falls back to
/// `{identifier}@realmbinder.local`. The lookup outcome never fails this
/// function — it only selects which address is attempted.
pub async fn resolve_login_email(provider: &dyn AuthProvider, identifier: &str) -> String {
    if identifier.contains('@') {
        return identifier.to_owned();
    }

    match provider.select_mapping(identifier).await {
        Ok(mapping) => mapping.email,
        Err(e) => {
            // A missing row and a failed lookup both fall back; only the log
            // field tells them apart.
            tracing::debug!(username = identifier, error = %e, "no login mapping, using fallback address");
            format!("{identifier}@{FALLBACK_DOMAIN}")
        }
    }
}

/// Sign in with a username or email plus password.
///
/// The identifier is resolved to an email first; the provider then decides
/// whether the credentials are valid. Resolution never masks an auth failure:
/// a wrong password on a fallback address surfaces exactly like one on a
/// mapped address.
///
/// # Errors
///
/// [`IdentityError::InvalidCredentials`] when the provider rejects the
/// credentials, [`IdentityError::Provider`] on transport/parse failure.
pub async fn sign_in_with_username_or_email(
    provider: &dyn AuthProvider,
    identifier: &str,
    password: &str,
) -> Result<Session, IdentityError> {
    let email = resolve_login_email(provider, identifier).await;
    tracing::debug!(%email, "attempting password sign-in");

    match provider.sign_in_with_password(&email, password).await {
        Ok(session) => Ok(session),
        Err(ProviderError::AuthRejected { message }) => {
            Err(IdentityError::InvalidCredentials { message })
        }
        Err(e) => Err(IdentityError::Provider(e)),
    }
}

/// Insert the username -> email mapping for a freshly created account.
///
/// No duplicate pre-check: the table's uniqueness constraint is the arbiter.
///
/// # Errors
///
/// Returns [`IdentityError::Provider`] when the insert is rejected (e.g.
/// duplicate username) or the provider cannot be reached. Callers decide
/// whether that is fatal; account creation flows should treat it as not.
pub async fn create_user_mapping(
    provider: &dyn AuthProvider,
    user_id: Uuid,
    username: &str,
    email: &str,
) -> Result<(), IdentityError> {
    let mapping = UsernameMapping {
        user_id,
        username: username.to_owned(),
        email: email.to_owned(),
    };
    provider.insert_mapping(&mapping).await?;
    tracing::info!(username, "login mapping created");
    Ok(())
}

/// Create an account and register its login mapping.
///
/// Mapping registration failure is logged and swallowed: the auth account
/// already exists, and username logins for it still work through the
/// fallback address.
///
/// # Errors
///
/// [`IdentityError::InvalidCredentials`] when the provider refuses the
/// registration, [`IdentityError::Provider`] on transport/parse failure.
/// Mapping-insert failure is never an error here.
pub async fn sign_up_with_username(
    provider: &dyn AuthProvider,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Session, IdentityError> {
    let session = match provider.sign_up(email, password).await {
        Ok(session) => session,
        Err(ProviderError::AuthRejected { message }) => {
            return Err(IdentityError::InvalidCredentials { message });
        }
        Err(e) => return Err(IdentityError::Provider(e)),
    };

    if let Err(e) = create_user_mapping(provider, session.user.id, username, email).await {
        tracing::warn!(
            username,
            error = %e,
            "login mapping not created; username sign-in will use the fallback address"
        );
    }

    Ok(session)
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
