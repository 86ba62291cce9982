//! HTTP-level tests for registration, login, bearer presentation, role
//! onboarding, and the current-user endpoint.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    body_json, build_test_app, get, get_auth, post_json, post_json_auth, register, send,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use marketgate_api::auth::jwt::Claims;
use marketgate_core::roles::UserRole;

// ---------------------------------------------------------------------------
// Registration and login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_returns_token_and_unset_user() {
    let test = build_test_app();
    let (token, user) = register(&test, "  New.User@Example.com ").await;

    assert!(!token.is_empty());
    assert_eq!(user["email"], "new.user@example.com");
    assert_eq!(user["role"], "unset");
    assert_eq!(user["isPremium"], false);
    assert!(user.get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_email_is_conflict_regardless_of_case() {
    let test = build_test_app();
    register(&test, "dup@example.com").await;

    let response = post_json(
        test.app(),
        "/api/v1/auth/register",
        serde_json::json!({ "email": "DUP@example.com", "password": "another-pass" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn short_password_is_rejected() {
    let test = build_test_app();
    let response = post_json(
        test.app(),
        "/api/v1/auth/register",
        serde_json::json!({ "email": "short@example.com", "password": "1234567" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn login_with_correct_password() {
    let test = build_test_app();
    register(&test, "login@example.com").await;

    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": "LOGIN@example.com", "password": "correct-horse" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["token"].is_string());
    assert_eq!(json["user"]["email"], "login@example.com");
}

#[tokio::test]
async fn login_ignores_surrounding_whitespace_and_case() {
    let test = build_test_app();
    register(&test, "bob@x.io").await;

    let response = post_json(
        test.app(),
        "/api/v1/auth/login",
        serde_json::json!({ "email": "  Bob@X.io ", "password": "correct-horse" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["email"], "bob@x.io");
}

#[tokio::test]
async fn login_with_wrong_password_or_unknown_email_is_401() {
    let test = build_test_app();
    register(&test, "wrongpw@example.com").await;

    for body in [
        serde_json::json!({ "email": "wrongpw@example.com", "password": "incorrect-horse" }),
        serde_json::json!({ "email": "ghost@example.com", "password": "correct-horse" }),
    ] {
        let response = post_json(test.app(), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "UNAUTHENTICATED");
    }
}

// ---------------------------------------------------------------------------
// Bearer presentation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn me_requires_a_token() {
    let test = build_test_app();
    let response = get(test.app(), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn me_accepts_header_or_cookie() {
    let test = build_test_app();
    let (token, _) = register(&test, "me@example.com").await;

    let response = get_auth(test.app(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["email"], "me@example.com");

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/auth/me")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let response = send(test.app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_failures_have_distinct_codes() {
    let test = build_test_app();
    let (token, user) = register(&test, "codes@example.com").await;

    // Signed with another secret.
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        id: user["id"].as_str().unwrap().parse().unwrap(),
        email: "codes@example.com".into(),
        name: None,
        user_type: UserRole::Unset,
        iat: now,
        exp: now + 3600,
    };
    let forged = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"not-the-server-secret"),
    )
    .unwrap();
    let response = get_auth(test.app(), "/api/v1/auth/me", &forged).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "TOKEN_INVALID_SIGNATURE");

    // Expired but correctly signed.
    let expired = encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            iat: now - 7200,
            exp: now - 60,
            ..claims
        },
        &EncodingKey::from_secret(common::JWT_SECRET.as_bytes()),
    )
    .unwrap();
    let response = get_auth(test.app(), "/api/v1/auth/me", &expired).await;
    assert_eq!(body_json(response).await["code"], "TOKEN_EXPIRED");

    // Garbage.
    let response = get_auth(test.app(), "/api/v1/auth/me", "garbage").await;
    assert_eq!(body_json(response).await["code"], "TOKEN_MALFORMED");

    // The real one still works.
    let response = get_auth(test.app(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Role onboarding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn role_can_be_chosen_once_and_reissues_token() {
    let test = build_test_app();
    let (token, _) = register(&test, "role@example.com").await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/auth/role",
        serde_json::json!({ "role": "seller" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["role"], "seller");
    let fresh = json["token"].as_str().unwrap().to_string();
    assert_ne!(fresh, token);

    // The old token still says `unset`, but the stored role wins.
    let response = post_json_auth(
        test.app(),
        "/api/v1/auth/role",
        serde_json::json!({ "role": "buyer" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(test.app(), "/api/v1/auth/me", &fresh).await;
    assert_eq!(body_json(response).await["data"]["role"], "seller");
}

#[tokio::test]
async fn admin_is_not_an_onboarding_choice() {
    let test = build_test_app();
    let (token, _) = register(&test, "sneaky@example.com").await;

    for role in ["admin", "unset", "wizard"] {
        let response = post_json_auth(
            test.app(),
            "/api/v1/auth/role",
            serde_json::json!({ "role": role }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "role {role}");
    }
}
