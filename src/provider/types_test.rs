use super::*;

fn sample_user() -> AuthUser {
    AuthUser { id: Uuid::nil(), email: Some("g@realm.example".into()) }
}

fn sample_session() -> Session {
    Session {
        access_token: "token-abc".into(),
        refresh_token: Some("refresh-def".into()),
        expires_in: Some(3600),
        user: sample_user(),
    }
}

// =============================================================================
// ProviderError display
// =============================================================================

#[test]
fn missing_env_display_names_var() {
    let err = ProviderError::MissingEnv { var: "SUPABASE_URL".into() };
    assert!(err.to_string().contains("SUPABASE_URL"));
}

#[test]
fn auth_rejected_display_contains_message() {
    let err = ProviderError::AuthRejected { message: "Invalid login credentials".into() };
    let msg = err.to_string();
    assert!(msg.contains("authentication rejected"));
    assert!(msg.contains("Invalid login credentials"));
}

#[test]
fn api_response_display_contains_status() {
    let err = ProviderError::ApiResponse { status: 503, body: "unavailable".into() };
    assert!(err.to_string().contains("503"));
}

#[test]
fn no_row_display() {
    assert!(ProviderError::NoRow.to_string().contains("no row"));
}

// =============================================================================
// AuthUser / Session serde
// =============================================================================

#[test]
fn auth_user_deserialize_ignores_unknown_fields() {
    let json = r#"{"id": "00000000-0000-0000-0000-000000000000", "aud": "authenticated", "email": "g@realm.example", "role": "authenticated"}"#;
    let user: AuthUser = serde_json::from_str(json).unwrap();
    assert_eq!(user.id, Uuid::nil());
    assert_eq!(user.email.as_deref(), Some("g@realm.example"));
}

#[test]
fn auth_user_deserialize_null_email() {
    let json = r#"{"id": "00000000-0000-0000-0000-000000000000", "email": null}"#;
    let user: AuthUser = serde_json::from_str(json).unwrap();
    assert!(user.email.is_none());
}

#[test]
fn session_serde_round_trip() {
    let session = sample_session();
    let json = serde_json::to_string(&session).unwrap();
    let restored: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, session);
}

#[test]
fn session_deserialize_without_refresh_token() {
    let json = r#"{"access_token": "t", "user": {"id": "00000000-0000-0000-0000-000000000000", "email": "a@b.c"}}"#;
    let session: Session = serde_json::from_str(json).unwrap();
    assert!(session.refresh_token.is_none());
    assert!(session.expires_in.is_none());
}

// =============================================================================
// UsernameMapping serde
// =============================================================================

#[test]
fn username_mapping_serialize_field_names() {
    let mapping = UsernameMapping {
        user_id: Uuid::nil(),
        username: "gandalf".into(),
        email: "g@realm.example".into(),
    };
    let value: serde_json::Value = serde_json::to_value(&mapping).unwrap();
    assert_eq!(value["user_id"], "00000000-0000-0000-0000-000000000000");
    assert_eq!(value["username"], "gandalf");
    assert_eq!(value["email"], "g@realm.example");
}

#[test]
fn username_mapping_deserialize() {
    let json = r#"{"user_id": "00000000-0000-0000-0000-000000000000", "username": "frodo", "email": "f@shire.example"}"#;
    let mapping: UsernameMapping = serde_json::from_str(json).unwrap();
    assert_eq!(mapping.username, "frodo");
    assert_eq!(mapping.email, "f@shire.example");
}

// =============================================================================
// SessionEvent
// =============================================================================

#[test]
fn session_event_clone_keeps_session() {
    let event = SessionEvent { change: SessionChange::SignedIn, session: Some(sample_session()) };
    let cloned = event.clone();
    assert_eq!(cloned.change, SessionChange::SignedIn);
    assert_eq!(cloned.session, event.session);
}

#[test]
fn session_change_variants_distinct() {
    assert_ne!(SessionChange::SignedIn, SessionChange::SignedOut);
    assert_ne!(SessionChange::SignedOut, SessionChange::TokenRefreshed);
}
