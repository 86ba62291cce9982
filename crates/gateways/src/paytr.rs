//! PayTR hosted payment page.
//!
//! Two flows are covered:
//!
//! | Flow      | Direction        | Signature message                                                    |
//! |-----------|------------------|----------------------------------------------------------------------|
//! | get-token | merchant -> PayTR | `merchant_id user_ip merchant_oid email payment_amount user_basket no_installment max_installment currency test_mode merchant_salt` |
//! | callback  | PayTR -> merchant | `merchant_oid merchant_salt status total_amount`                     |
//!
//! Fields are concatenated without separators and signed with
//! `base64(HMAC-SHA256(merchant_key, message))`. Amounts are integers in
//! minor units (kuruş).

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use marketgate_core::error::CoreError;
use marketgate_core::hashing::{hmac_sha256_base64, verify_hmac_sha256_base64};
use marketgate_core::payment::PurchaseStatus;
use marketgate_core::plans::format_minor;
use serde::Deserialize;

/// Default get-token endpoint.
pub const DEFAULT_API_URL: &str = "https://www.paytr.com/odeme/api/get-token";

/// Hosted page the browser is sent to; the session token is appended.
pub const REDIRECT_BASE_URL: &str = "https://www.paytr.com/odeme/guvenli/";

/// Literal body PayTR expects in response to every callback.
pub const CALLBACK_ACK: &str = "OK";

/// Installment flags sent with every session (gateway defaults).
const NO_INSTALLMENT: &str = "0";
const MAX_INSTALLMENT: &str = "0";

/// Minutes the hosted page stays valid.
const TIMEOUT_LIMIT_MINS: &str = "30";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PaymentGatewayError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("Payment gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Payment gateway returned HTTP {0}")]
    HttpStatus(u16),

    /// The gateway answered but refused to open a session.
    #[error("Payment gateway rejected the session: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PaytrConfig {
    pub merchant_id: String,
    pub merchant_key: String,
    pub merchant_salt: String,
    pub test_mode: bool,
    pub ok_url: String,
    pub fail_url: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl PaytrConfig {
    fn test_mode_flag(&self) -> &'static str {
        if self.test_mode {
            "1"
        } else {
            "0"
        }
    }
}

/// One line of the basket shown on the hosted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketItem {
    pub name: String,
    pub amount_minor: i64,
    pub quantity: u32,
}

/// Everything needed to open a hosted payment session for one order.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub merchant_oid: String,
    pub email: String,
    pub user_ip: String,
    pub user_name: String,
    pub user_address: String,
    pub user_phone: String,
    pub amount_minor: i64,
    pub currency: String,
    pub basket: Vec<BasketItem>,
}

/// What the browser needs to continue on the hosted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub token: String,
    pub redirect_url: String,
}

impl PaymentSession {
    pub fn from_token(token: String) -> Self {
        let redirect_url = format!("{REDIRECT_BASE_URL}{token}");
        Self {
            token,
            redirect_url,
        }
    }
}

/// Server-to-server notification, posted form-encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackPayload {
    pub merchant_oid: String,
    pub status: String,
    pub total_amount: String,
    pub hash: String,
    #[serde(default)]
    pub failed_reason_code: Option<String>,
    #[serde(default)]
    pub failed_reason_msg: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub test_mode: Option<String>,
}

impl CallbackPayload {
    /// The terminal status this notification reports.
    pub fn purchase_status(&self) -> Result<PurchaseStatus, CoreError> {
        match self.status.as_str() {
            "success" => Ok(PurchaseStatus::Success),
            "failed" => Ok(PurchaseStatus::Failed),
            other => Err(CoreError::Validation(format!(
                "Unexpected callback status '{other}'"
            ))),
        }
    }

    /// Human-readable failure detail, if the gateway sent any.
    pub fn failure_reason(&self) -> Option<String> {
        match (&self.failed_reason_code, &self.failed_reason_msg) {
            (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
            (None, Some(msg)) => Some(msg.clone()),
            (Some(code), None) => Some(code.clone()),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// `base64` of the JSON array `[[name, "99.90", quantity], ...]`.
pub fn encode_basket(items: &[BasketItem]) -> String {
    let rows: Vec<serde_json::Value> = items
        .iter()
        .map(|item| {
            serde_json::json!([item.name, format_minor(item.amount_minor), item.quantity])
        })
        .collect();
    STANDARD.encode(serde_json::Value::Array(rows).to_string())
}

/// Signature over a get-token request.
pub fn request_token(config: &PaytrConfig, request: &SessionRequest, user_basket: &str) -> String {
    let message = format!(
        "{}{}{}{}{}{}{}{}{}{}{}",
        config.merchant_id,
        request.user_ip,
        request.merchant_oid,
        request.email,
        request.amount_minor,
        user_basket,
        NO_INSTALLMENT,
        MAX_INSTALLMENT,
        request.currency,
        config.test_mode_flag(),
        config.merchant_salt,
    );
    hmac_sha256_base64(config.merchant_key.as_bytes(), message.as_bytes())
}

/// Expected signature of a callback.
pub fn callback_hash(
    merchant_key: &str,
    merchant_salt: &str,
    merchant_oid: &str,
    status: &str,
    total_amount: &str,
) -> String {
    let message = format!("{merchant_oid}{merchant_salt}{status}{total_amount}");
    hmac_sha256_base64(merchant_key.as_bytes(), message.as_bytes())
}

/// Constant-time check of a callback's `hash` field.
pub fn verify_callback(merchant_key: &str, merchant_salt: &str, payload: &CallbackPayload) -> bool {
    let message = format!(
        "{}{}{}{}",
        payload.merchant_oid, merchant_salt, payload.status, payload.total_amount
    );
    verify_hmac_sha256_base64(merchant_key.as_bytes(), message.as_bytes(), &payload.hash)
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted payment session.
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<PaymentSession, PaymentGatewayError>;

    /// Does the notification carry a valid gateway signature?
    fn verify_callback(&self, payload: &CallbackPayload) -> bool;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    status: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Result<PaymentSession, PaymentGatewayError> {
        match (self.status.as_str(), self.token) {
            ("success", Some(token)) if !token.is_empty() => Ok(PaymentSession::from_token(token)),
            _ => Err(PaymentGatewayError::Rejected(
                self.reason.unwrap_or_else(|| "no token returned".into()),
            )),
        }
    }
}

/// [`PaymentGateway`] talking to PayTR over HTTPS.
pub struct PaytrGateway {
    client: reqwest::Client,
    config: PaytrConfig,
}

impl PaytrGateway {
    pub fn new(config: PaytrConfig) -> Result<Self, PaymentGatewayError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn form_fields(&self, request: &SessionRequest) -> Vec<(&'static str, String)> {
        let user_basket = encode_basket(&request.basket);
        let paytr_token = request_token(&self.config, request, &user_basket);
        let test_mode = self.config.test_mode_flag().to_string();

        vec![
            ("merchant_id", self.config.merchant_id.clone()),
            ("user_ip", request.user_ip.clone()),
            ("merchant_oid", request.merchant_oid.clone()),
            ("email", request.email.clone()),
            ("payment_amount", request.amount_minor.to_string()),
            ("paytr_token", paytr_token),
            ("user_basket", user_basket),
            ("debug_on", test_mode.clone()),
            ("no_installment", NO_INSTALLMENT.into()),
            ("max_installment", MAX_INSTALLMENT.into()),
            ("user_name", request.user_name.clone()),
            ("user_address", request.user_address.clone()),
            ("user_phone", request.user_phone.clone()),
            ("merchant_ok_url", self.config.ok_url.clone()),
            ("merchant_fail_url", self.config.fail_url.clone()),
            ("timeout_limit", TIMEOUT_LIMIT_MINS.into()),
            ("currency", request.currency.clone()),
            ("test_mode", test_mode),
        ]
    }
}

#[async_trait]
impl PaymentGateway for PaytrGateway {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<PaymentSession, PaymentGatewayError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .form(&self.form_fields(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PaymentGatewayError::HttpStatus(response.status().as_u16()));
        }

        let session = response.json::<TokenResponse>().await?.into_session()?;
        tracing::debug!(merchant_oid = %request.merchant_oid, "Payment session opened");
        Ok(session)
    }

    fn verify_callback(&self, payload: &CallbackPayload) -> bool {
        verify_callback(&self.config.merchant_key, &self.config.merchant_salt, payload)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
