//! Hosted auth & data provider integration.
//!
//! DESIGN
//! ======
//! The [`AuthProvider`] trait mirrors the surface this app consumes from the
//! hosted backend: current-user probe, password sign-in/sign-up, sign-out, a
//! session-change stream, and single-row table access for the login-mapping
//! table. [`SupabaseClient`] is the concrete HTTP implementation; tests fake
//! the trait instead of the network.

pub mod config;
pub mod supabase;
pub mod types;

pub use config::ProviderConfig;
pub use supabase::SupabaseClient;
pub use types::{
    AuthProvider, AuthUser, ProviderError, Session, SessionChange, SessionEvent, UsernameMapping,
};
