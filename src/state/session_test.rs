use serde_json::json;

use super::*;
use crate::error::ApiError;
use crate::state::test_helpers::{MockApi, login_json, network_down};
use crate::storage::MemoryBlobStore;

fn store_with(api: &Arc<MockApi>, storage: &Arc<MemoryBlobStore>, locale: Locale) -> SessionStore {
    SessionStore::new(api.clone(), storage.clone(), locale)
}

fn fresh(api: &Arc<MockApi>) -> (SessionStore, Arc<MemoryBlobStore>) {
    let storage = Arc::new(MemoryBlobStore::new());
    (store_with(api, &storage, Locale::En), storage)
}

// =============================================================================
// LOGIN
// =============================================================================

#[tokio::test]
async fn login_sets_session_and_persists_it() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    let (store, storage) = fresh(&api);

    let resp = store.login("alice", "pw1").await.unwrap();

    assert_eq!(resp.access_token, "tok123");
    assert!(store.is_authenticated());
    assert_eq!(store.token().as_deref(), Some("tok123"));
    assert_eq!(store.username().as_deref(), Some("alice"));
    assert!(!store.is_loading());
    assert_eq!(store.error(), None);
    assert_eq!(api.bearer().as_deref(), Some("tok123"));

    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok123"));
    let stored: User = serde_json::from_str(&storage.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(stored.username, "alice");
}

#[tokio::test]
async fn failed_login_keeps_prior_session_and_uses_server_detail() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    api.fail("login", ApiError::from_status(401, r#"{"detail":"Incorrect username or password"}"#));
    let (store, _storage) = fresh(&api);

    store.login("alice", "pw1").await.unwrap();
    let err = store.login("alice", "wrong").await.unwrap_err();

    assert_eq!(err.message(), "Incorrect username or password");
    assert_eq!(err.api_error().status(), Some(401));
    assert_eq!(store.error().as_deref(), Some("Incorrect username or password"));
    assert_eq!(store.token().as_deref(), Some("tok123"));
    assert!(store.is_authenticated());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn failed_login_without_detail_uses_localized_fallback() {
    let api = MockApi::new();
    api.fail("login", network_down());
    let storage = Arc::new(MemoryBlobStore::new());
    let store = store_with(&api, &storage, Locale::Vi);

    let err = store.login("alice", "pw1").await.unwrap_err();

    assert_eq!(err.message(), "Đăng nhập thất bại");
    assert_eq!(store.error().as_deref(), Some("Đăng nhập thất bại"));
    assert!(!store.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY), None);
}

#[tokio::test]
async fn new_login_clears_previous_error() {
    let api = MockApi::new();
    api.fail("login", network_down());
    api.respond("login", login_json("tok123", "alice"));
    let (store, _storage) = fresh(&api);

    store.login("alice", "bad").await.unwrap_err();
    assert!(store.error().is_some());
    store.login("alice", "pw1").await.unwrap();
    assert_eq!(store.error(), None);
}

#[tokio::test]
async fn login_is_loading_while_in_flight() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    let gate = api.gate("login");
    let (store, _storage) = fresh(&api);

    let (result, ()) = tokio::join!(store.login("alice", "pw1"), async {
        assert!(store.is_loading());
        gate.send(()).unwrap();
    });

    result.unwrap();
    assert!(!store.is_loading());
}

// =============================================================================
// STALE COMPLETIONS
// =============================================================================

#[tokio::test]
async fn older_login_completing_last_is_discarded() {
    let api = MockApi::new();
    api.respond("login", login_json("tokA", "alice"));
    api.respond("login", login_json("tokB", "bob"));
    let gate_a = api.gate("login");
    let (store, storage) = fresh(&api);

    let (first, second) = tokio::join!(store.login("alice", "pw"), async {
        let result = store.login("bob", "pw").await;
        gate_a.send(()).unwrap();
        result
    });

    // Both callers get their own answer; only the newest is applied.
    assert_eq!(first.unwrap().access_token, "tokA");
    assert_eq!(second.unwrap().access_token, "tokB");
    assert_eq!(store.token().as_deref(), Some("tokB"));
    assert_eq!(store.username().as_deref(), Some("bob"));
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tokB"));
    assert_eq!(api.bearer().as_deref(), Some("tokB"));
}

#[tokio::test]
async fn stale_login_failure_does_not_set_error() {
    let api = MockApi::new();
    api.fail("login", network_down());
    api.respond("login", login_json("tokB", "bob"));
    let gate_a = api.gate("login");
    let (store, _storage) = fresh(&api);

    let (first, second) = tokio::join!(store.login("alice", "pw"), async {
        let result = store.login("bob", "pw").await;
        gate_a.send(()).unwrap();
        result
    });

    assert!(first.is_err());
    assert!(second.is_ok());
    assert_eq!(store.error(), None);
    assert_eq!(store.username().as_deref(), Some("bob"));
}

#[tokio::test]
async fn login_completing_after_logout_is_discarded() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    let gate = api.gate("login");
    let (store, storage) = fresh(&api);

    let (result, ()) = tokio::join!(store.login("alice", "pw1"), async {
        store.logout().await;
        gate.send(()).unwrap();
    });

    assert!(result.is_ok());
    assert!(!store.is_authenticated());
    assert!(!store.is_loading());
    assert_eq!(storage.get(TOKEN_KEY), None);
    assert_eq!(api.bearer(), None);
}

// =============================================================================
// LOGOUT / CLEAR
// =============================================================================

#[tokio::test]
async fn logout_clears_even_when_backend_fails() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    api.fail("logout", network_down());
    let (store, storage) = fresh(&api);
    store.login("alice", "pw1").await.unwrap();

    store.logout().await;

    assert!(!store.is_authenticated());
    assert_eq!(store.token(), None);
    assert_eq!(store.user(), None);
    assert_eq!(storage.get(TOKEN_KEY), None);
    assert_eq!(storage.get(USER_KEY), None);
    assert_eq!(api.bearer(), None);
    assert_eq!(api.calls(), vec!["login alice", "logout alice"]);
}

#[tokio::test]
async fn logout_notification_carries_session_token() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    api.respond("logout", json!({"message": "Logged out successfully"}));
    let (store, _storage) = fresh(&api);
    store.login("alice", "pw1").await.unwrap();

    store.logout().await;

    let calls = api.calls_with_bearer();
    assert_eq!(calls.last(), Some(&("logout alice".to_owned(), Some("tok123".to_owned()))));
    assert_eq!(api.bearer(), None);
}

#[tokio::test]
async fn session_is_cleared_before_logout_notification_resolves() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    api.respond("logout", json!({"message": "Logged out successfully"}));
    let (store, storage) = fresh(&api);
    store.login("alice", "pw1").await.unwrap();
    let gate = api.gate("logout");

    tokio::join!(store.logout(), async {
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY), None);
        gate.send(()).unwrap();
    });

    assert_eq!(api.bearer(), None);
}

#[tokio::test]
async fn login_during_logout_notification_keeps_its_token() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    api.respond("login", login_json("tokB", "bob"));
    api.respond("logout", json!({"message": "Logged out successfully"}));
    let (store, _storage) = fresh(&api);
    store.login("alice", "pw1").await.unwrap();
    let gate = api.gate("logout");

    let ((), second) = tokio::join!(store.logout(), async {
        let result = store.login("bob", "pw").await;
        gate.send(()).unwrap();
        result
    });

    second.unwrap();
    assert_eq!(store.username().as_deref(), Some("bob"));
    assert_eq!(api.bearer().as_deref(), Some("tokB"));
}

#[tokio::test]
async fn logout_without_user_skips_backend() {
    let api = MockApi::new();
    let (store, _storage) = fresh(&api);

    store.logout().await;

    assert!(api.calls().is_empty());
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn clear_drops_session_without_network() {
    let api = MockApi::new();
    api.respond("login", login_json("tok123", "alice"));
    let (store, storage) = fresh(&api);
    store.login("alice", "pw1").await.unwrap();

    store.clear();

    assert_eq!(store.snapshot(), SessionState::default());
    assert_eq!(storage.get(TOKEN_KEY), None);
    assert_eq!(api.calls(), vec!["login alice"]);
}

// =============================================================================
// REGISTER
// =============================================================================

#[tokio::test]
async fn register_does_not_sign_in() {
    let api = MockApi::new();
    api.respond("register", json!({"_id": "u1", "username": "carol", "email": null}));
    let (store, storage) = fresh(&api);

    let user = store.register("carol", "pw", Some("  ")).await.unwrap();

    assert_eq!(user.username, "carol");
    assert!(!store.is_authenticated());
    assert!(!store.is_loading());
    assert_eq!(storage.get(TOKEN_KEY), None);
}

#[tokio::test]
async fn register_failure_surfaces_detail() {
    let api = MockApi::new();
    api.fail("register", ApiError::from_status(400, r#"{"detail":"Username already registered"}"#));
    let (store, _storage) = fresh(&api);

    let err = store.register("alice", "pw", None).await.unwrap_err();

    assert_eq!(err.message(), "Username already registered");
    assert_eq!(store.error().as_deref(), Some("Username already registered"));
}

#[tokio::test]
async fn register_failure_without_detail_uses_fallback() {
    let api = MockApi::new();
    api.fail("register", ApiError::from_status(422, r#"{"detail":[{"msg":"field required"}]}"#));
    let (store, _storage) = fresh(&api);

    let err = store.register("alice", "pw", None).await.unwrap_err();
    assert_eq!(err.message(), "Registration failed");
}

#[tokio::test]
async fn login_finishing_during_register_keeps_loading() {
    let api = MockApi::new();
    api.respond("register", json!({"username": "carol"}));
    api.respond("login", login_json("tok123", "alice"));
    let gate = api.gate("register");
    let (store, _storage) = fresh(&api);

    let (registered, ()) = tokio::join!(store.register("carol", "pw", None), async {
        store.login("alice", "pw1").await.unwrap();
        assert!(store.is_loading());
        gate.send(()).unwrap();
    });

    registered.unwrap();
    assert!(!store.is_loading());
}

// =============================================================================
// RESTORE
// =============================================================================

#[test]
fn load_from_storage_restores_complete_session() {
    let api = MockApi::new();
    let storage = Arc::new(MemoryBlobStore::new());
    storage.set(TOKEN_KEY, "tok123").unwrap();
    storage.set(USER_KEY, r#"{"_id":"u1","username":"alice"}"#).unwrap();
    let store = store_with(&api, &storage, Locale::En);

    assert!(store.load_from_storage());
    assert!(store.is_authenticated());
    assert_eq!(store.username().as_deref(), Some("alice"));
    assert_eq!(api.bearer().as_deref(), Some("tok123"));
}

#[test]
fn token_without_user_stays_signed_out() {
    let api = MockApi::new();
    let storage = Arc::new(MemoryBlobStore::new());
    storage.set(TOKEN_KEY, "tok123").unwrap();
    let store = store_with(&api, &storage, Locale::En);

    assert!(!store.load_from_storage());
    assert!(!store.is_authenticated());
    assert_eq!(store.username(), None);
}

#[test]
fn corrupt_user_entry_stays_signed_out() {
    let api = MockApi::new();
    let storage = Arc::new(MemoryBlobStore::new());
    storage.set(TOKEN_KEY, "tok123").unwrap();
    storage.set(USER_KEY, "{not json").unwrap();
    let store = store_with(&api, &storage, Locale::En);

    assert!(!store.load_from_storage());
    assert!(!store.is_authenticated());
    assert_eq!(api.bearer(), None);
}

#[test]
fn empty_token_stays_signed_out() {
    let api = MockApi::new();
    let storage = Arc::new(MemoryBlobStore::new());
    storage.set(TOKEN_KEY, "").unwrap();
    storage.set(USER_KEY, r#"{"username":"alice"}"#).unwrap();
    let store = store_with(&api, &storage, Locale::En);

    assert!(!store.load_from_storage());
}
