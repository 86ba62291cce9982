//! Tests for the premium status endpoint and the authorization extractors,
//! which always consult the stored record rather than token claims.

mod common;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use common::{body_json, build_test_app, get_auth, register, TestApp};
use marketgate_api::middleware::rbac::{RequireAdmin, RequirePremium};
use marketgate_core::roles::UserRole;

/// A router exposing one route behind each gate, sharing the app's state.
fn gated(test: &TestApp) -> Router {
    Router::new()
        .route("/admin", get(|RequireAdmin(_): RequireAdmin| async { "admin" }))
        .route(
            "/premium",
            get(|RequirePremium(_): RequirePremium| async { "premium" }),
        )
        .with_state(test.state.clone())
}

fn user_id(user: &serde_json::Value) -> uuid::Uuid {
    user["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn premium_status_reflects_the_store() {
    let test = build_test_app();
    let (token, user) = register(&test, "flag@example.com").await;

    let response = get_auth(test.app(), "/api/v1/entitlements/premium", &token).await;
    assert_eq!(body_json(response).await["data"]["isPremium"], false);

    test.store.set_premium(user_id(&user), true).await;
    let response = get_auth(test.app(), "/api/v1/entitlements/premium", &token).await;
    assert_eq!(body_json(response).await["data"]["isPremium"], true);
}

#[tokio::test]
async fn premium_gate_follows_stored_flag() {
    let test = build_test_app();
    let (token, user) = register(&test, "gate@example.com").await;

    let response = get_auth(gated(&test), "/premium", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");

    test.store.set_premium(user_id(&user), true).await;
    let response = get_auth(gated(&test), "/premium", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Revocation takes effect without a new token.
    test.store.set_premium(user_id(&user), false).await;
    let response = get_auth(gated(&test), "/premium", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_gate_reads_stored_role_not_token() {
    let test = build_test_app();
    let (token, user) = register(&test, "boss@example.com").await;

    // Token says `unset`.
    let response = get_auth(gated(&test), "/admin", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    test.store.set_role(user_id(&user), UserRole::Admin).await;
    let response = get_auth(gated(&test), "/admin", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn gates_require_authentication() {
    let test = build_test_app();
    let response = common::get(gated(&test), "/premium").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
