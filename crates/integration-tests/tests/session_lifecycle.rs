//! Session persistence and token rejection.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use reqwest::StatusCode;
use secrecy::SecretString;

use agent_portal_client::api::ApiError;
use agent_portal_client::{
    AccessToken, ClientConfig, ClientError, CreationError, DASHBOARD_ROUTE, ENTRY_ROUTE,
    Navigation, PortalClient, Role, SessionStore, UserId,
};
use agent_portal_integration_tests::StubApi;

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

#[tokio::test]
async fn test_session_survives_client_restart() {
    let stub = StubApi::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("nested").join("session.json");

    let first = PortalClient::new(stub.config(&session_file)).unwrap();
    let session = first
        .auth()
        .login("carol", &secret("carol-pass"))
        .await
        .unwrap();
    drop(first);

    let second = PortalClient::new(stub.config(&session_file)).unwrap();
    assert_eq!(second.current_session(), session);

    // The restored token still works.
    let profile = second.api().profile().await.unwrap();
    assert_eq!(profile.username.as_deref(), Some("carol"));
    assert_eq!(profile.role, Some(Role::Customer));
}

#[tokio::test]
async fn test_logout_removes_persisted_session() {
    let stub = StubApi::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");

    let client = PortalClient::new(stub.config(&session_file)).unwrap();
    client
        .auth()
        .login("bob", &secret("bob-pass"))
        .await
        .unwrap();
    assert!(session_file.exists());

    client.auth().logout().unwrap();

    let reopened = PortalClient::new(stub.config(&session_file)).unwrap();
    assert!(reopened.current_session().is_empty());
}

#[tokio::test]
async fn test_revoked_token_clears_session_on_next_call() {
    let stub = StubApi::spawn().await;
    let (client, backend) = stub.client();
    client
        .auth()
        .login("bob", &secret("bob-pass"))
        .await
        .unwrap();

    stub.revoke_tokens();
    let err = client.api().list_agents().await.unwrap_err();

    match &err {
        ApiError::SessionRejected {
            status,
            redirect_to,
        } => {
            assert_eq!(*status, StatusCode::UNAUTHORIZED);
            assert_eq!(*redirect_to, ENTRY_ROUTE);
        }
        other => panic!("expected SessionRejected, got {other:?}"),
    }
    assert_eq!(ClientError::from(err).redirect_to(), Some(ENTRY_ROUTE));
    assert!(client.current_session().is_empty());
    assert_eq!(backend.stored(), None);
    assert_eq!(client.navigate("/home"), Navigation::Redirect(ENTRY_ROUTE));
}

#[tokio::test]
async fn test_forbidden_admin_call_clears_session() {
    let stub = StubApi::spawn().await;
    let (client, _backend) = stub.client();
    client
        .auth()
        .login("carol", &secret("carol-pass"))
        .await
        .unwrap();

    let err = client.api().list_users().await.unwrap_err();

    assert_eq!(err.redirect_to(), Some(ENTRY_ROUTE));
    assert!(client.current_session().is_empty());
}

#[tokio::test]
async fn test_calls_without_token_fail_locally() {
    let stub = StubApi::spawn().await;
    let (client, _backend) = stub.client();

    let err = client.api().list_agents().await.unwrap_err();

    assert!(matches!(err, ApiError::NotAuthenticated));
    assert_eq!(err.redirect_to(), Some(ENTRY_ROUTE));
}

#[tokio::test]
async fn test_guard_follows_logged_in_role() {
    let stub = StubApi::spawn().await;
    let (client, _backend) = stub.client();

    assert!(matches!(client.navigate("/"), Navigation::Render(_)));
    assert!(!client.shows_navbar("/"));

    client
        .auth()
        .login("bob", &secret("bob-pass"))
        .await
        .unwrap();

    assert!(client.shows_navbar("/home"));
    assert!(matches!(client.navigate("/chat/a-hr"), Navigation::Render(_)));
    assert_eq!(
        client.navigate("/update/a-hr"),
        Navigation::Redirect(DASHBOARD_ROUTE)
    );
    assert_eq!(client.navigate("/no-such-page"), Navigation::NotFound);

    let caps = client.capabilities();
    assert!(caps.chat);
    assert!(!caps.manage_agents);
}

/// Stores a newer session while the request is in flight, then rejects the
/// token the request arrived with.
async fn relogin_then_reject(State(store): State<SessionStore>) -> StatusCode {
    store
        .set_session(AccessToken::new("t2"), Role::Admin, UserId::new("u-ann"), "ann")
        .unwrap();
    StatusCode::UNAUTHORIZED
}

async fn client_racing_a_relogin() -> PortalClient {
    let store = SessionStore::in_memory();
    store
        .set_session(AccessToken::new("t1"), Role::Employee, UserId::new("u-bob"), "bob")
        .unwrap();

    let app = Router::new()
        .route("/agents/", get(relogin_then_reject))
        .route("/create-user", post(relogin_then_reject))
        .with_state(store.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let config = ClientConfig::new(&url, "/unused").unwrap();
    PortalClient::with_session(config, store).unwrap()
}

#[tokio::test]
async fn test_stale_rejection_keeps_newer_session() {
    let client = client_racing_a_relogin().await;

    let err = client.api().list_agents().await.unwrap_err();

    assert!(matches!(err, ApiError::SessionRejected { .. }));
    let session = client.current_session();
    assert_eq!(session.token, Some(AccessToken::new("t2")));
    assert_eq!(session.username.as_deref(), Some("ann"));
}

#[tokio::test]
async fn test_stale_rejection_on_create_user_keeps_newer_session() {
    let client = client_racing_a_relogin().await;

    let err = client
        .auth()
        .create_user("grace", &secret("pw"), Role::Customer)
        .await
        .unwrap_err();

    assert!(matches!(err, CreationError::SessionRejected { .. }));
    assert_eq!(client.current_session().token, Some(AccessToken::new("t2")));
}
