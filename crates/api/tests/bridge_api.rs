//! HTTP-level tests for exchanging provider assertions for bearer tokens.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, get_auth, post_json, provider_assertion, register,
    CLERK_SECRET, GOOGLE_SECRET,
};

async fn bridge(test: &common::TestApp, provider: &str, assertion: &str) -> axum::response::Response {
    post_json(
        test.app(),
        "/api/v1/auth/bridge",
        serde_json::json!({ "provider": provider, "assertion": assertion }),
    )
    .await
}

#[tokio::test]
async fn first_sign_in_creates_an_account() {
    let test = build_test_app();
    let assertion = provider_assertion("Fresh@Example.com", GOOGLE_SECRET);

    let response = bridge(&test, "google", &assertion).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["email"], "fresh@example.com");
    assert_eq!(json["user"]["identityProvider"], "google");
    assert_eq!(json["user"]["role"], "unset");

    let token = json["token"].as_str().unwrap();
    let me = get_auth(test.app(), "/api/v1/auth/me", token).await;
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn second_provider_links_to_the_same_user() {
    let test = build_test_app();

    let first = body_json(
        bridge(&test, "google", &provider_assertion("link@example.com", GOOGLE_SECRET)).await,
    )
    .await;
    let second = body_json(
        bridge(&test, "clerk", &provider_assertion("LINK@example.com", CLERK_SECRET)).await,
    )
    .await;

    assert_eq!(first["user"]["id"], second["user"]["id"]);
}

#[tokio::test]
async fn provider_sign_in_links_to_password_account() {
    let test = build_test_app();
    let (_, registered) = register(&test, "both@example.com").await;

    let json = body_json(
        bridge(&test, "google", &provider_assertion("both@example.com", GOOGLE_SECRET)).await,
    )
    .await;
    assert_eq!(json["user"]["id"], registered["id"]);

    // The password still works after linking.
    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": "both@example.com", "password": "correct-horse" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn assertion_signed_for_another_provider_is_rejected() {
    let test = build_test_app();
    let response = bridge(&test, "google", &provider_assertion("x@example.com", CLERK_SECRET)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_INVALID_SIGNATURE");
}

#[tokio::test]
async fn non_external_or_unknown_provider_is_a_validation_error() {
    let test = build_test_app();
    let assertion = provider_assertion("x@example.com", GOOGLE_SECRET);

    for provider in ["none", "github"] {
        let response = bridge(&test, provider, &assertion).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "provider {provider}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}
