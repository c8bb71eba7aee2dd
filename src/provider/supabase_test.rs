use super::*;
use crate::provider::config::ProviderTimeouts;

fn test_config() -> ProviderConfig {
    ProviderConfig {
        base_url: "https://proj.supabase.co".into(),
        anon_key: "anon-key".into(),
        timeouts: ProviderTimeouts { request_secs: 5, connect_secs: 2 },
    }
}

fn test_client() -> SupabaseClient {
    SupabaseClient::new(test_config()).unwrap()
}

// =============================================================================
// parse_session
// =============================================================================

#[test]
fn parse_session_full_token_response() {
    let json = r#"{
        "access_token": "jwt-abc",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-xyz",
        "user": {"id": "00000000-0000-0000-0000-000000000000", "aud": "authenticated", "email": "g@realm.example"}
    }"#;
    let session = parse_session(json).unwrap();
    assert_eq!(session.access_token, "jwt-abc");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-xyz"));
    assert_eq!(session.expires_in, Some(3600));
    assert_eq!(session.user.email.as_deref(), Some("g@realm.example"));
}

#[test]
fn parse_session_garbage_is_parse_error() {
    let err = parse_session("not json").unwrap_err();
    assert!(matches!(err, ProviderError::ApiParse(_)));
}

#[test]
fn parse_session_missing_access_token_is_parse_error() {
    let json = r#"{"user": {"id": "00000000-0000-0000-0000-000000000000", "email": null}}"#;
    assert!(matches!(parse_session(json), Err(ProviderError::ApiParse(_))));
}

// =============================================================================
// parse_user
// =============================================================================

#[test]
fn parse_user_ok() {
    let json = r#"{"id": "00000000-0000-0000-0000-000000000000", "aud": "authenticated", "email": "f@shire.example", "created_at": "2024-01-01T00:00:00Z"}"#;
    let user = parse_user(json).unwrap();
    assert_eq!(user.email.as_deref(), Some("f@shire.example"));
}

#[test]
fn parse_user_invalid_uuid_is_parse_error() {
    let json = r#"{"id": "not-a-uuid", "email": "f@shire.example"}"#;
    assert!(matches!(parse_user(json), Err(ProviderError::ApiParse(_))));
}

// =============================================================================
// parse_mapping
// =============================================================================

#[test]
fn parse_mapping_single_object() {
    let json = r#"{"user_id": "00000000-0000-0000-0000-000000000000", "username": "gandalf", "email": "g@realm.example"}"#;
    let mapping = parse_mapping(json).unwrap();
    assert_eq!(mapping.username, "gandalf");
    assert_eq!(mapping.email, "g@realm.example");
}

#[test]
fn parse_mapping_array_is_parse_error() {
    // Single-object mode never returns an array; treat one as malformed.
    let json = r#"[{"user_id": "00000000-0000-0000-0000-000000000000", "username": "g", "email": "e"}]"#;
    assert!(matches!(parse_mapping(json), Err(ProviderError::ApiParse(_))));
}

// =============================================================================
// parse_auth_error_message
// =============================================================================

#[test]
fn auth_error_message_prefers_error_description() {
    let json = r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#;
    assert_eq!(parse_auth_error_message(json), "Invalid login credentials");
}

#[test]
fn auth_error_message_falls_back_to_msg() {
    let json = r#"{"code": 400, "msg": "Email not confirmed"}"#;
    assert_eq!(parse_auth_error_message(json), "Email not confirmed");
}

#[test]
fn auth_error_message_falls_back_to_error() {
    let json = r#"{"error": "invalid_grant"}"#;
    assert_eq!(parse_auth_error_message(json), "invalid_grant");
}

#[test]
fn auth_error_message_garbage_uses_default() {
    assert_eq!(parse_auth_error_message("<html>"), "invalid credentials");
}

// =============================================================================
// Client behavior without a session (no network involved)
// =============================================================================

#[tokio::test]
async fn get_current_user_without_session_is_none() {
    let client = test_client();
    let user = client.get_current_user().await.unwrap();
    assert!(user.is_none());
}

#[tokio::test]
async fn sign_out_without_session_succeeds_and_emits() {
    let client = test_client();
    let mut events = client.subscribe_session_changes();

    client.sign_out().await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.change, SessionChange::SignedOut);
    assert!(event.session.is_none());
}

#[tokio::test]
async fn dropped_receivers_do_not_break_later_subscriptions() {
    let client = test_client();
    let rx_a = client.subscribe_session_changes();
    let rx_b = client.subscribe_session_changes();
    drop(rx_a);
    drop(rx_b);
    // Dropping receivers must not poison later subscriptions.
    let mut rx_c = client.subscribe_session_changes();
    client.sign_out().await.unwrap();
    assert!(rx_c.recv().await.is_ok());
}
