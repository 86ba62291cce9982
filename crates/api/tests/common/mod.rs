#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;

use marketgate_api::app::build_app;
use marketgate_api::auth::assertion::{ProviderAssertion, ProviderSecrets};
use marketgate_api::auth::jwt::JwtConfig;
use marketgate_api::config::ServerConfig;
use marketgate_api::state::AppState;
use marketgate_db::MemoryStore;
use marketgate_gateways::fake::{FakePaymentGateway, RecordingSmsGateway};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const GOOGLE_SECRET: &str = "google-assertion-secret";
pub const CLERK_SECRET: &str = "clerk-assertion-secret";
pub const MERCHANT_KEY: &str = "integration-merchant-key";
pub const MERCHANT_SALT: &str = "integration-merchant-salt";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upstream_timeout_secs: 2,
        production: false,
        default_country_code: "90".to_string(),
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiry_days: 30,
            using_fallback: false,
        },
        providers: ProviderSecrets {
            google: Some(GOOGLE_SECRET.to_string()),
            clerk: Some(CLERK_SECRET.to_string()),
        },
        sms: None,
        paytr: None,
    }
}

/// The application plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub sms: Arc<RecordingSmsGateway>,
    pub payments: Arc<FakePaymentGateway>,
}

impl TestApp {
    /// A fresh router sharing this app's state. `oneshot` consumes the router,
    /// so take one per request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers, backed by
/// an in-memory store and recording gateways.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let sms = Arc::new(RecordingSmsGateway::new());
    let payments = Arc::new(FakePaymentGateway::new(MERCHANT_KEY, MERCHANT_SALT));

    let state = AppState {
        store: store.clone(),
        config: Arc::new(test_config()),
        sms: sms.clone(),
        payments: payments.clone(),
    };
    let router = build_app(state.clone()).expect("test CORS origins are valid");

    TestApp {
        router,
        state,
        store,
        sms,
        payments,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_form(app: Router, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{k}={}", form_escape(v)))
        .collect::<Vec<_>>()
        .join("&");
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

/// Percent-encode the characters base64 signatures and messages contain.
fn form_escape(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => c.to_string(),
            ' ' => "+".to_string(),
            other => {
                let mut buf = [0u8; 4];
                other
                    .encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{b:02X}"))
                    .collect()
            }
        })
        .collect()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body is readable")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body is JSON")
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("body is UTF-8")
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Register a password account through the API and return `(token, user_json)`.
pub async fn register(test: &TestApp, email: &str) -> (String, serde_json::Value) {
    let response = post_json(
        test.app(),
        "/api/v1/auth/register",
        serde_json::json!({ "email": email, "password": "correct-horse", "name": "Test User" }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    let token = json["token"].as_str().expect("token in response").to_string();
    (token, json["user"].clone())
}

/// A provider assertion for `email`, signed with `secret`, valid for a minute.
pub fn provider_assertion(email: &str, secret: &str) -> String {
    let claims = ProviderAssertion {
        sub: format!("provider|{email}"),
        email: email.to_string(),
        name: Some("Provider User".to_string()),
        picture: Some("https://img.test/avatar.png".to_string()),
        exp: chrono::Utc::now().timestamp() + 60,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encoding should succeed")
}
