//! The gateway callback must answer `OK` even when settling the purchase
//! stalls past every deadline or panics outright.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::Router;
use common::{body_text, post_form, test_config, MERCHANT_KEY, MERCHANT_SALT};
use marketgate_api::app::build_app;
use marketgate_api::state::AppState;
use marketgate_core::identity::IdentityProvider;
use marketgate_core::payment::PurchaseStatus;
use marketgate_core::plans::PlanId;
use marketgate_core::roles::UserRole;
use marketgate_core::types::{DbId, Timestamp};
use marketgate_db::models::challenge::{CreateChallenge, PhoneChallenge};
use marketgate_db::models::purchase::{CreatePurchase, Purchase};
use marketgate_db::models::user::{CreateUser, LinkIdentity, User};
use marketgate_db::store::{ChallengeStore, PurchaseStore, UserStore};
use marketgate_db::{MemoryStore, SettleOutcome, StoreResult};
use marketgate_gateways::fake::{FakePaymentGateway, RecordingSmsGateway};

const CALLBACK: &str = "/api/v1/payments/callback";
const OID: &str = "MGresilience0000000000000000000001";

// ---------------------------------------------------------------------------
// A store whose settle step misbehaves
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum SettleMode {
    Stall(Duration),
    Panic,
}

/// Delegates to [`MemoryStore`], except that `settle_purchase` stalls or panics.
struct MisbehavingStore {
    inner: Arc<MemoryStore>,
    mode: SettleMode,
}

#[async_trait]
impl UserStore for MisbehavingStore {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        self.inner.create_user(input).await
    }

    async fn link_identity(&self, id: DbId, link: &LinkIdentity) -> StoreResult<Option<User>> {
        self.inner.link_identity(id, link).await
    }

    async fn set_role_if_unset(&self, id: DbId, role: UserRole) -> StoreResult<Option<User>> {
        self.inner.set_role_if_unset(id, role).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

#[async_trait]
impl ChallengeStore for MisbehavingStore {
    async fn replace_challenge(
        &self,
        input: &CreateChallenge,
        now: Timestamp,
    ) -> StoreResult<PhoneChallenge> {
        self.inner.replace_challenge(input, now).await
    }

    async fn find_pending_challenge(
        &self,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<PhoneChallenge>> {
        self.inner.find_pending_challenge(user_id, phone_number).await
    }

    async fn delete_challenge(&self, id: DbId) -> StoreResult<()> {
        self.inner.delete_challenge(id).await
    }

    async fn complete_challenge(
        &self,
        challenge_id: DbId,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<User>> {
        self.inner
            .complete_challenge(challenge_id, user_id, phone_number)
            .await
    }
}

#[async_trait]
impl PurchaseStore for MisbehavingStore {
    async fn create_purchase(&self, input: &CreatePurchase) -> StoreResult<Purchase> {
        self.inner.create_purchase(input).await
    }

    async fn find_purchase(&self, merchant_oid: &str) -> StoreResult<Option<Purchase>> {
        self.inner.find_purchase(merchant_oid).await
    }

    async fn settle_purchase(
        &self,
        merchant_oid: &str,
        status: PurchaseStatus,
        failure_reason: Option<&str>,
    ) -> StoreResult<Option<SettleOutcome>> {
        match self.mode {
            SettleMode::Stall(delay) => tokio::time::sleep(delay).await,
            SettleMode::Panic => panic!("settle exploded"),
        }
        self.inner
            .settle_purchase(merchant_oid, status, failure_reason)
            .await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An app with one-second deadlines over a misbehaving store seeded with a
/// pending purchase.
async fn build_app_with(mode: SettleMode) -> (Router, Arc<MemoryStore>, Arc<FakePaymentGateway>) {
    let inner = Arc::new(MemoryStore::new());
    let user = inner
        .create_user(&CreateUser {
            email: "slow@example.com".into(),
            name: None,
            avatar_url: None,
            password_hash: None,
            identity_provider: IdentityProvider::None,
        })
        .await
        .unwrap();
    inner
        .create_purchase(&CreatePurchase {
            merchant_oid: OID.into(),
            user_id: user.id,
            plan_id: PlanId::Monthly,
            amount_minor: 9_990,
            currency: "TL".into(),
        })
        .await
        .unwrap();

    let mut config = test_config();
    config.request_timeout_secs = 1;
    config.upstream_timeout_secs = 1;

    let payments = Arc::new(FakePaymentGateway::new(MERCHANT_KEY, MERCHANT_SALT));
    let state = AppState {
        store: Arc::new(MisbehavingStore {
            inner: inner.clone(),
            mode,
        }),
        config: Arc::new(config),
        sms: Arc::new(RecordingSmsGateway::new()),
        payments: payments.clone(),
    };
    let router = build_app(state).expect("test CORS origins are valid");
    (router, inner, payments)
}

async fn post_signed_success(app: Router, payments: &FakePaymentGateway) -> (StatusCode, String) {
    let hash = payments.sign_callback(OID, "success", "9990");
    let response = post_form(
        app,
        CALLBACK,
        &[
            ("merchant_oid", OID),
            ("status", "success"),
            ("total_amount", "9990"),
            ("hash", hash.as_str()),
        ],
    )
    .await;
    let status = response.status();
    (status, body_text(response).await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stalled_settle_is_still_acknowledged() {
    let (app, _inner, payments) = build_app_with(SettleMode::Stall(Duration::from_secs(3))).await;

    let (status, body) = post_signed_success(app, &payments).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn settle_finishes_in_background_after_acknowledgment() {
    let (app, inner, payments) = build_app_with(SettleMode::Stall(Duration::from_secs(2))).await;

    let (status, _) = post_signed_success(app, &payments).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let purchase = inner.find_purchase(OID).await.unwrap().unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Success);
    let user = inner.find_user_by_id(purchase.user_id).await.unwrap().unwrap();
    assert!(user.is_premium);
}

#[tokio::test]
async fn panicking_settle_is_still_acknowledged() {
    let (app, inner, payments) = build_app_with(SettleMode::Panic).await;

    let (status, body) = post_signed_success(app, &payments).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let purchase = inner.find_purchase(OID).await.unwrap().unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Pending);
}
