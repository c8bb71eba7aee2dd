//! Authentication and session core for the Realm Binder companion app.
//!
//! This crate is UI-framework agnostic so client crates can consume it
//! directly: it resolves username-or-email logins against the hosted
//! provider's mapping table, registers mappings at account creation, and
//! tracks the current session as an explicit observable state machine.

pub mod provider;
pub mod services;

pub use provider::{
    AuthProvider, AuthUser, ProviderConfig, ProviderError, Session, SessionChange, SessionEvent,
    SupabaseClient, UsernameMapping,
};
pub use services::identity::{
    FALLBACK_DOMAIN, IdentityError, create_user_mapping, resolve_login_email,
    sign_in_with_username_or_email, sign_up_with_username,
};
pub use services::session::{SessionState, SessionTracker};
