use std::sync::Arc;

use realm_binder::{ProviderConfig, SessionTracker, SupabaseClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ProviderConfig::from_env().expect("SUPABASE_URL and SUPABASE_ANON_KEY required");
    let provider = Arc::new(SupabaseClient::new(config).expect("HTTP client init failed"));

    let tracker = SessionTracker::new(provider);
    tracker.start().await;

    match tracker.user() {
        Some(user) => tracing::info!(user_id = %user.id, "session restored"),
        None => tracing::info!("no active session"),
    }

    tracker.stop();
}
