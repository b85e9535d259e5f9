//! Letter generation and outgoing email.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use reqwest::StatusCode;
use secrecy::SecretString;

use agent_portal_client::PortalClient;
use agent_portal_client::api::{ApiError, Letter};
use agent_portal_integration_tests::{DOCX_BYTES, SentEmail, StubApi};

async fn logged_in_bob(stub: &StubApi) -> PortalClient {
    let (client, _backend) = stub.client();
    client
        .auth()
        .login("bob", &SecretString::from("bob-pass".to_string()))
        .await
        .unwrap();
    client
}

fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn test_text_template_returns_content() {
    let stub = StubApi::spawn().await;
    let bob = logged_in_bob(&stub).await;

    let letter = bob
        .api()
        .generate_letter("welcome", &fields(&[("name", "Dana")]))
        .await
        .unwrap();

    assert_eq!(letter, Letter::Text("Dear Dana, welcome aboard!".to_string()));
}

#[tokio::test]
async fn test_offer_letter_returns_document() {
    let stub = StubApi::spawn().await;
    let bob = logged_in_bob(&stub).await;

    let letter = bob
        .api()
        .generate_letter("offer_letter", &fields(&[("name", "Dana")]))
        .await
        .unwrap();

    match letter {
        Letter::Document { filename, bytes } => {
            assert_eq!(filename, "offer_letter.docx");
            assert_eq!(bytes, DOCX_BYTES);
        }
        Letter::Text(text) => panic!("expected a document, got text {text:?}"),
    }
}

#[tokio::test]
async fn test_missing_template_field_is_a_plain_error() {
    let stub = StubApi::spawn().await;
    let bob = logged_in_bob(&stub).await;

    let err = bob
        .api()
        .generate_letter("offer_letter", &BTreeMap::new())
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(message.contains("Missing field"));
        }
        other => panic!("expected Status, got {other:?}"),
    }
    assert!(bob.current_session().is_authenticated());
}

#[tokio::test]
async fn test_send_email() {
    let stub = StubApi::spawn().await;
    let bob = logged_in_bob(&stub).await;

    bob.api()
        .send_email("dana@example.com", "Welcome", "See you Monday.")
        .await
        .unwrap();

    assert_eq!(
        stub.sent_emails(),
        [SentEmail {
            to: "dana@example.com".to_string(),
            subject: "Welcome".to_string(),
            body: "See you Monday.".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_invalid_email_is_not_sent() {
    let stub = StubApi::spawn().await;
    let bob = logged_in_bob(&stub).await;

    let err = bob
        .api()
        .send_email("nobody", "Hi", "body")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = bob
        .api()
        .send_email("dana@example.com", " ", "body")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    assert!(stub.sent_emails().is_empty());
}
