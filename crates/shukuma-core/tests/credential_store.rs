//! End-to-end behaviour of `CredentialStore` over the bundled backends.

use std::sync::Arc;

use serde_json::{json, Value};
use shukuma_core::auth::{AUTH_TOKEN_KEY, USER_DATA_KEY};
use shukuma_core::{CredentialStore, EncryptedFileStore, MemoryStore, SecureStore, UserData};

fn memory_store() -> (Arc<MemoryStore>, CredentialStore) {
    let backend = Arc::new(MemoryStore::new());
    let store = CredentialStore::with_default_keys(backend.clone());
    (backend, store)
}

fn record(value: Value) -> UserData {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

#[tokio::test]
async fn test_login_resume_logout_scenario() {
    let (_backend, store) = memory_store();

    store.store_token("abc123").await.unwrap();
    assert_eq!(store.get_token().await.as_deref(), Some("abc123"));

    let user = record(json!({"username": "alex"}));
    store.store_user_data(&user).await.unwrap();
    assert_eq!(store.get_user_data().await, Some(user));

    store.clear_auth_data().await.unwrap();
    assert_eq!(store.get_token().await, None);
    assert_eq!(store.get_user_data().await, None);
    assert!(!store.is_authenticated().await);
}

#[tokio::test]
async fn test_non_empty_tokens_authenticate() {
    let (_backend, store) = memory_store();
    for token in ["a", "abc123", "eyJhbGciOiJIUzI1NiJ9.e30.sig", " ", "tøkén"] {
        store.store_token(token).await.unwrap();
        assert_eq!(store.get_token().await.as_deref(), Some(token));
        assert!(store.is_authenticated().await, "token {:?} should authenticate", token);
    }
}

#[tokio::test]
async fn test_empty_token_is_present_but_signed_out() {
    let (backend, store) = memory_store();
    store.store_token("abc123").await.unwrap();
    store.store_token("").await.unwrap();

    assert!(backend.contains_key(AUTH_TOKEN_KEY));
    assert!(!store.is_authenticated().await);
}

#[tokio::test]
async fn test_user_data_round_trips() {
    let (_backend, store) = memory_store();
    let records = [
        json!({}),
        json!({"username": "alex"}),
        json!({
            "username": "alex",
            "profile": {"age": 29, "height_cm": 181.5, "tags": ["runner", null, true]},
            "unicode": "Ubuntu – ŝukuma 💪",
            "empty": {}
        }),
    ];

    for value in records {
        let user = record(value);
        store.store_user_data(&user).await.unwrap();
        assert_eq!(store.get_user_data().await, Some(user));
    }
}

#[tokio::test]
async fn test_delete_token_from_any_state() {
    let (_backend, store) = memory_store();

    store.delete_token().await.unwrap();
    assert_eq!(store.get_token().await, None);

    store.store_token("abc123").await.unwrap();
    store.delete_token().await.unwrap();
    assert_eq!(store.get_token().await, None);
    assert!(!store.is_authenticated().await);
}

#[tokio::test]
async fn test_deletes_are_independent() {
    let (backend, store) = memory_store();
    store.store_token("abc123").await.unwrap();
    store
        .store_user_data(&record(json!({"username": "alex"})))
        .await
        .unwrap();

    store.delete_user_data().await.unwrap();
    assert!(store.is_authenticated().await);
    assert!(!backend.contains_key(USER_DATA_KEY));
}

#[tokio::test]
async fn test_read_failure_fails_open() {
    let (backend, store) = memory_store();
    store.store_token("abc123").await.unwrap();
    store
        .store_user_data(&record(json!({"username": "alex"})))
        .await
        .unwrap();

    backend.set_fail_reads(true);
    assert_eq!(store.get_token().await, None);
    assert_eq!(store.get_user_data().await, None);
    assert!(!store.is_authenticated().await);

    backend.set_fail_reads(false);
    assert!(store.is_authenticated().await);
}

#[tokio::test]
async fn test_write_failure_keeps_prior_state() {
    let (backend, store) = memory_store();
    let user = record(json!({"username": "alex"}));
    store.store_token("abc123").await.unwrap();
    store.store_user_data(&user).await.unwrap();

    backend.set_fail_writes(true);
    assert!(store.store_token("other").await.is_err());
    assert!(store
        .store_user_data(&record(json!({"username": "sam"})))
        .await
        .is_err());
    assert!(store.clear_auth_data().await.is_err());
    backend.set_fail_writes(false);

    assert_eq!(store.get_token().await.as_deref(), Some("abc123"));
    assert_eq!(store.get_user_data().await, Some(user));
}

#[tokio::test]
async fn test_write_failure_on_empty_store() {
    let (backend, store) = memory_store();
    backend.set_fail_writes(true);

    let err = store.store_token("abc123").await.unwrap_err();
    assert!(err.to_string().starts_with("Failed to store authentication token"));
    backend.set_fail_writes(false);
    assert_eq!(store.get_token().await, None);
}

#[tokio::test]
async fn test_clear_fails_if_token_delete_fails() {
    let (backend, store) = memory_store();
    store.store_token("abc123").await.unwrap();
    store
        .store_user_data(&record(json!({"username": "alex"})))
        .await
        .unwrap();
    backend.fail_deletes_for(AUTH_TOKEN_KEY).unwrap();

    let err = store.clear_auth_data().await.unwrap_err();
    assert!(err.message().contains(AUTH_TOKEN_KEY));
    assert!(store.is_authenticated().await);
    assert_eq!(store.get_user_data().await, None);
}

#[tokio::test]
async fn test_encrypted_vault_persists_across_stores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.skv");
    let user = record(json!({"username": "alex", "level": "beginner"}));

    {
        let backend = Arc::new(EncryptedFileStore::open(&path, "passphrase").unwrap());
        let store = CredentialStore::with_default_keys(backend);
        store.store_token("abc123").await.unwrap();
        store.store_user_data(&user).await.unwrap();
    }

    let backend = Arc::new(EncryptedFileStore::open(&path, "passphrase").unwrap());
    assert_eq!(
        backend.get(AUTH_TOKEN_KEY).unwrap().as_deref(),
        Some("abc123")
    );
    let store = CredentialStore::with_default_keys(backend);
    assert!(store.is_authenticated().await);
    assert_eq!(store.get_user_data().await, Some(user));

    store.clear_auth_data().await.unwrap();
    assert!(!store.is_authenticated().await);
}

#[tokio::test]
async fn test_wrong_vault_passphrase_reads_as_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.skv");

    let backend = Arc::new(EncryptedFileStore::open(&path, "passphrase").unwrap());
    CredentialStore::with_default_keys(backend)
        .store_token("abc123")
        .await
        .unwrap();

    let wrong = Arc::new(EncryptedFileStore::open(&path, "guess").unwrap());
    let store = CredentialStore::with_default_keys(wrong);
    assert_eq!(store.get_token().await, None);
    assert!(!store.is_authenticated().await);
    assert!(store.store_token("other").await.is_err());
}
