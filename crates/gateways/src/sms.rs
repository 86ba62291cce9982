//! Messaging gateway used to deliver one-time codes.
//!
//! The provider is reached with a JSON `POST` carrying `{to, from, text}` and
//! bearer authentication. It answers `{success: true, messageId}` or
//! `{success: false, error}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("SMS request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("SMS provider returned HTTP {0}")]
    HttpStatus(u16),

    /// The provider answered but refused to deliver.
    #[error("SMS provider rejected the message: {0}")]
    Rejected(String),
}

/// Proof of a successful hand-off to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsReceipt {
    pub provider_message_id: String,
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Deliver `body` to an E.164 phone number.
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError>;
}

// ---------------------------------------------------------------------------
// HTTP provider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    from: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    success: bool,
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SendResponse {
    fn into_receipt(self) -> Result<SmsReceipt, SmsError> {
        if !self.success {
            return Err(SmsError::Rejected(
                self.error.unwrap_or_else(|| "unspecified error".into()),
            ));
        }
        Ok(SmsReceipt {
            provider_message_id: self.message_id.unwrap_or_default(),
        })
    }
}

/// [`SmsGateway`] speaking the provider's JSON API over HTTPS.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    config: SmsConfig,
}

impl HttpSmsGateway {
    pub fn new(config: SmsConfig) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        let request = SendRequest {
            to,
            from: &self.config.sender,
            text: body,
        };
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SmsError::HttpStatus(response.status().as_u16()));
        }

        let receipt = response.json::<SendResponse>().await?.into_receipt()?;
        tracing::debug!(
            provider_message_id = %receipt.provider_message_id,
            "SMS accepted by provider"
        );
        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// Log-only sink
// ---------------------------------------------------------------------------

/// Development sink used when no provider is configured. Writes the message
/// to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogSmsGateway;

#[async_trait]
impl SmsGateway for LogSmsGateway {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        tracing::info!(to, body, "SMS delivery disabled, message logged only");
        Ok(SmsReceipt {
            provider_message_id: "log-only".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
