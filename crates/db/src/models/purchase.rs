//! Purchase record model.

use marketgate_core::payment::PurchaseStatus;
use marketgate_core::plans::PlanId;
use marketgate_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// One attempt to buy a premium plan, keyed by its merchant order id.
#[derive(Debug, Clone, FromRow)]
pub struct Purchase {
    pub id: DbId,
    /// Caller-generated idempotency key shared with the payment gateway.
    pub merchant_oid: String,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub plan_id: PlanId,
    pub amount_minor: i64,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: PurchaseStatus,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Purchase representation returned to the owning user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub merchant_oid: String,
    pub plan_id: PlanId,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PurchaseStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Purchase> for PurchaseResponse {
    fn from(p: &Purchase) -> Self {
        Self {
            merchant_oid: p.merchant_oid.clone(),
            plan_id: p.plan_id,
            amount_minor: p.amount_minor,
            currency: p.currency.clone(),
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// DTO for recording a freshly initiated purchase (always `pending`).
#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub merchant_oid: String,
    pub user_id: DbId,
    pub plan_id: PlanId,
    pub amount_minor: i64,
    pub currency: String,
}
