//! Repository for the `purchases` table.

use marketgate_core::payment::PurchaseStatus;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::purchase::{CreatePurchase, Purchase};

const COLUMNS: &str = "id, merchant_oid, user_id, plan_id, amount_minor, currency, status, \
                       failure_reason, created_at, updated_at";

pub struct PurchaseRepo;

impl PurchaseRepo {
    /// Insert a purchase in `pending` status.
    pub async fn create(pool: &PgPool, input: &CreatePurchase) -> Result<Purchase, sqlx::Error> {
        let query = format!(
            "INSERT INTO purchases (id, merchant_oid, user_id, plan_id, amount_minor, currency)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Purchase>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.merchant_oid)
            .bind(input.user_id)
            .bind(input.plan_id.as_str())
            .bind(input.amount_minor)
            .bind(&input.currency)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_merchant_oid(
        pool: &PgPool,
        merchant_oid: &str,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchases WHERE merchant_oid = $1");
        sqlx::query_as::<_, Purchase>(&query)
            .bind(merchant_oid)
            .fetch_optional(pool)
            .await
    }

    /// Load a purchase and hold its row lock until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        merchant_oid: &str,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchases WHERE merchant_oid = $1 FOR UPDATE");
        sqlx::query_as::<_, Purchase>(&query)
            .bind(merchant_oid)
            .fetch_optional(conn)
            .await
    }

    /// Move a pending purchase to a terminal status.
    ///
    /// Returns `None` if the purchase is no longer pending.
    pub async fn finalize(
        conn: &mut PgConnection,
        merchant_oid: &str,
        status: PurchaseStatus,
        failure_reason: Option<&str>,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let query = format!(
            "UPDATE purchases SET status = $2, failure_reason = $3, updated_at = NOW()
             WHERE merchant_oid = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Purchase>(&query)
            .bind(merchant_oid)
            .bind(status.as_str())
            .bind(failure_reason)
            .fetch_optional(conn)
            .await
    }
}
