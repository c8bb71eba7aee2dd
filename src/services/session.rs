//! Session tracking — observable auth state for the current user.
//!
//! DESIGN
//! ======
//! Explicit state machine replacing the reactive user/loading pair a UI
//! framework would own: `Unknown` until the first current-user probe
//! resolves, then `Authenticated` or `Anonymous`. Consumers watch the state
//! through a `tokio::sync::watch` channel.
//!
//! The provider's session-change subscription is the one resource with an
//! acquire/release discipline here: `start()` takes exactly one subscription,
//! `stop()` (or drop) releases it.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::provider::types::{AuthProvider, AuthUser, ProviderError, Session, SessionEvent};
use crate::services::identity::{self, IdentityError};

// =============================================================================
// STATE
// =============================================================================

/// Auth state of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Initial probe not finished yet; UIs should hold rendering.
    Unknown,
    /// A session is active for this user.
    Authenticated(AuthUser),
    /// No session.
    Anonymous,
}

impl SessionState {
    /// True until the initial current-user probe has resolved.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unknown | Self::Anonymous => None,
        }
    }
}

fn state_for(event: &SessionEvent) -> SessionState {
    match &event.session {
        Some(session) => SessionState::Authenticated(session.user.clone()),
        None => SessionState::Anonymous,
    }
}

// =============================================================================
// TRACKER
// =============================================================================

/// Tracks the current user's session against the hosted provider.
pub struct SessionTracker {
    provider: Arc<dyn AuthProvider>,
    state: watch::Sender<SessionState>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionTracker {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self { provider, state, listener: Mutex::new(None) }
    }

    /// Acquire the session-change subscription and run the initial
    /// current-user probe. Idempotent: a second `start` while running is a
    /// no-op, keeping exactly one subscription per tracker.
    pub async fn start(&self) {
        {
            let mut listener = self
                .listener
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if listener.is_some() {
                tracing::debug!("session tracker already started");
                return;
            }

            let events = self.provider.subscribe_session_changes();
            *listener = Some(spawn_listener(events, self.state.clone()));
        }

        self.check_user().await;
    }

    /// Release the session-change subscription. Idempotent.
    pub fn stop(&self) {
        let mut listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }

    /// Probe the provider for the current user and settle the state.
    ///
    /// A failed probe counts as "no user": the state becomes `Anonymous` and
    /// the loading gate clears either way, so consumers are never stuck on
    /// `Unknown`.
    pub async fn check_user(&self) {
        let next = match self.provider.get_current_user().await {
            Ok(Some(user)) => SessionState::Authenticated(user),
            Ok(None) => SessionState::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "current-user probe failed, treating as signed out");
                SessionState::Anonymous
            }
        };
        self.state.send_replace(next);
    }

    /// End the current session.
    ///
    /// On success the state transitions to `Anonymous` before this returns;
    /// the notification stream may be debounced and is not waited for. On
    /// failure the state is left untouched so the UI can offer a retry.
    ///
    /// # Errors
    ///
    /// Returns the [`ProviderError`] from the sign-out call.
    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!(error = %e, "sign-out failed, session state unchanged");
            return Err(e);
        }
        self.state.send_replace(SessionState::Anonymous);
        Ok(())
    }

    /// Sign in with a username or email. See
    /// [`identity::sign_in_with_username_or_email`].
    ///
    /// # Errors
    ///
    /// Propagates the [`IdentityError`] from the sign-in flow.
    pub async fn sign_in_with_username_or_email(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        identity::sign_in_with_username_or_email(self.provider.as_ref(), identifier, password).await
    }

    /// Register a login mapping for a freshly created account. See
    /// [`identity::create_user_mapping`].
    ///
    /// # Errors
    ///
    /// Propagates the [`IdentityError`] from the insert.
    pub async fn create_user_mapping(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<(), IdentityError> {
        identity::create_user_mapping(self.provider.as_ref(), user_id, username, email).await
    }

    /// Current snapshot of the authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    /// True until the initial current-user probe has resolved.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch the session state. The receiver sees every transition made
    /// after this call.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_listener(
    mut events: broadcast::Receiver<SessionEvent>,
    state: watch::Sender<SessionState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::debug!(change = ?event.change, "session change received");
                    state.send_replace(state_for(&event));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Only the latest session matters; dropped intermediate
                    // events are harmless.
                    tracing::warn!(skipped, "session event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
