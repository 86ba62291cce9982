//! In-process gateway doubles for tests and local development.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::paytr::{
    callback_hash, verify_callback, CallbackPayload, PaymentGateway, PaymentGatewayError,
    PaymentSession, SessionRequest,
};
use crate::sms::{SmsError, SmsGateway, SmsReceipt};

/// One message handed to [`RecordingSmsGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
}

/// Records every message instead of sending it; can be told to fail.
#[derive(Default)]
pub struct RecordingSmsGateway {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl RecordingSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with [`SmsError::Rejected`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn last(&self) -> Option<SentMessage> {
        self.sent.lock().await.last().cloned()
    }
}

#[async_trait]
impl SmsGateway for RecordingSmsGateway {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SmsError::Rejected("simulated outage".into()));
        }
        let mut sent = self.sent.lock().await;
        sent.push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(SmsReceipt {
            provider_message_id: format!("fake-{}", sent.len()),
        })
    }
}

/// Opens fake sessions and signs/verifies callbacks with a local key pair.
pub struct FakePaymentGateway {
    merchant_key: String,
    merchant_salt: String,
    sessions: Mutex<Vec<SessionRequest>>,
    failing: AtomicBool,
}

impl FakePaymentGateway {
    pub fn new(merchant_key: impl Into<String>, merchant_salt: impl Into<String>) -> Self {
        Self {
            merchant_key: merchant_key.into(),
            merchant_salt: merchant_salt.into(),
            sessions: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make subsequent session requests fail with [`PaymentGatewayError::Rejected`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sessions(&self) -> Vec<SessionRequest> {
        self.sessions.lock().await.clone()
    }

    /// Signature the real gateway would attach to this notification.
    pub fn sign_callback(&self, merchant_oid: &str, status: &str, total_amount: &str) -> String {
        callback_hash(
            &self.merchant_key,
            &self.merchant_salt,
            merchant_oid,
            status,
            total_amount,
        )
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<PaymentSession, PaymentGatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentGatewayError::Rejected("simulated outage".into()));
        }
        self.sessions.lock().await.push(request.clone());
        Ok(PaymentSession::from_token(format!(
            "fake-{}",
            request.merchant_oid
        )))
    }

    fn verify_callback(&self, payload: &CallbackPayload) -> bool {
        verify_callback(&self.merchant_key, &self.merchant_salt, payload)
    }
}
