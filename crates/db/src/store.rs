//! Storage traits consumed by the API, and their PostgreSQL implementation.
//!
//! Every method that changes more than one record, or checks a status before
//! changing it, is atomic: callers never observe a half-applied update.

use async_trait::async_trait;
use marketgate_core::error::CoreError;
use marketgate_core::identity::normalize_email;
use marketgate_core::payment::{decide_transition, PurchaseStatus, Transition};
use marketgate_core::roles::UserRole;
use marketgate_core::types::{DbId, Timestamp};

use crate::models::challenge::{CreateChallenge, PhoneChallenge};
use crate::models::purchase::{CreatePurchase, Purchase};
use crate::models::user::{CreateUser, LinkIdentity, User};
use crate::repositories::{ChallengeRepo, PurchaseRepo, UserRepo};
use crate::DbPool;

/// Errors surfaced by any [`Store`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique field already holds this value.
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),

    #[error(transparent)]
    Domain(#[from] CoreError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of applying a gateway notification to a purchase.
#[derive(Debug, Clone)]
pub enum SettleOutcome {
    /// The purchase was pending and now carries the incoming status.
    Applied(Purchase),
    /// The same terminal status was already recorded; nothing changed.
    AlreadyApplied(Purchase),
    /// A different terminal status is recorded; nothing changed.
    Conflict(Purchase),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>>;

    /// Case-insensitive exact match on the canonical email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;

    async fn link_identity(&self, id: DbId, link: &LinkIdentity) -> StoreResult<Option<User>>;

    /// Guarded `unset -> role` transition; `None` if not applied.
    async fn set_role_if_unset(&self, id: DbId, role: UserRole) -> StoreResult<Option<User>>;

    /// Prove the backing store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Purge expired challenges, discard unverified ones for the same pair,
    /// then insert the new one, in that order.
    async fn replace_challenge(
        &self,
        input: &CreateChallenge,
        now: Timestamp,
    ) -> StoreResult<PhoneChallenge>;

    /// The authoritative (most recent unverified) challenge for a pair.
    async fn find_pending_challenge(
        &self,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<PhoneChallenge>>;

    async fn delete_challenge(&self, id: DbId) -> StoreResult<()>;

    /// Mark the challenge verified and store the phone on the user together.
    ///
    /// Returns `None` (and changes nothing) if the challenge was already
    /// consumed or removed.
    async fn complete_challenge(
        &self,
        challenge_id: DbId,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] if the merchant order id is reused.
    async fn create_purchase(&self, input: &CreatePurchase) -> StoreResult<Purchase>;

    async fn find_purchase(&self, merchant_oid: &str) -> StoreResult<Option<Purchase>>;

    /// Apply a terminal status per [`decide_transition`], granting premium on
    /// the owning user when a pending purchase succeeds.
    ///
    /// Returns `None` if no purchase has this merchant order id.
    async fn settle_purchase(
        &self,
        merchant_oid: &str,
        status: PurchaseStatus,
        failure_reason: Option<&str>,
    ) -> StoreResult<Option<SettleOutcome>>;
}

/// Everything the API needs from persistence.
pub trait Store: UserStore + ChallengeStore + PurchaseStore {}

impl<T: UserStore + ChallengeStore + PurchaseStore> Store for T {}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`Store`] backed by the shared PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Map a unique-constraint violation on `constraint` to [`StoreError::Duplicate`].
fn map_unique(err: sqlx::Error, constraint: &str, field: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint) {
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&self.pool, &normalize_email(email)).await?)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        UserRepo::create(&self.pool, input)
            .await
            .map_err(|e| map_unique(e, "uq_users_email", "email"))
    }

    async fn link_identity(&self, id: DbId, link: &LinkIdentity) -> StoreResult<Option<User>> {
        Ok(UserRepo::link_identity(&self.pool, id, link).await?)
    }

    async fn set_role_if_unset(&self, id: DbId, role: UserRole) -> StoreResult<Option<User>> {
        Ok(UserRepo::set_role_if_unset(&self.pool, id, role).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

#[async_trait]
impl ChallengeStore for PgStore {
    async fn replace_challenge(
        &self,
        input: &CreateChallenge,
        now: Timestamp,
    ) -> StoreResult<PhoneChallenge> {
        let mut tx = self.pool.begin().await?;
        ChallengeRepo::lock_pair(&mut *tx, input.user_id, &input.phone_number).await?;
        let purged = ChallengeRepo::purge_expired(&mut *tx, now).await?;
        let superseded =
            ChallengeRepo::supersede_pending(&mut *tx, input.user_id, &input.phone_number).await?;
        let challenge = ChallengeRepo::create(&mut *tx, input).await?;
        tx.commit().await?;

        tracing::debug!(
            user_id = %input.user_id,
            purged,
            superseded,
            "Phone challenge replaced"
        );
        Ok(challenge)
    }

    async fn find_pending_challenge(
        &self,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<PhoneChallenge>> {
        Ok(ChallengeRepo::find_pending(&self.pool, user_id, phone_number).await?)
    }

    async fn delete_challenge(&self, id: DbId) -> StoreResult<()> {
        ChallengeRepo::delete(&self.pool, id).await?;
        Ok(())
    }

    async fn complete_challenge(
        &self,
        challenge_id: DbId,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<User>> {
        let mut tx = self.pool.begin().await?;
        if !ChallengeRepo::mark_verified(&mut *tx, challenge_id).await? {
            return Ok(None);
        }
        let Some(user) = UserRepo::mark_phone_verified(&mut *tx, user_id, phone_number).await?
        else {
            return Ok(None);
        };
        tx.commit().await?;
        Ok(Some(user))
    }
}

#[async_trait]
impl PurchaseStore for PgStore {
    async fn create_purchase(&self, input: &CreatePurchase) -> StoreResult<Purchase> {
        PurchaseRepo::create(&self.pool, input)
            .await
            .map_err(|e| map_unique(e, "uq_purchases_merchant_oid", "merchant_oid"))
    }

    async fn find_purchase(&self, merchant_oid: &str) -> StoreResult<Option<Purchase>> {
        Ok(PurchaseRepo::find_by_merchant_oid(&self.pool, merchant_oid).await?)
    }

    async fn settle_purchase(
        &self,
        merchant_oid: &str,
        status: PurchaseStatus,
        failure_reason: Option<&str>,
    ) -> StoreResult<Option<SettleOutcome>> {
        let mut tx = self.pool.begin().await?;
        let Some(current) = PurchaseRepo::find_for_update(&mut *tx, merchant_oid).await? else {
            return Ok(None);
        };

        match decide_transition(current.status, status)? {
            Transition::Duplicate => Ok(Some(SettleOutcome::AlreadyApplied(current))),
            Transition::Conflict => Ok(Some(SettleOutcome::Conflict(current))),
            Transition::Apply => {
                let updated =
                    PurchaseRepo::finalize(&mut *tx, merchant_oid, status, failure_reason)
                        .await?
                        .ok_or(sqlx::Error::RowNotFound)?;
                if status == PurchaseStatus::Success {
                    UserRepo::grant_premium(&mut *tx, updated.user_id).await?;
                }
                tx.commit().await?;
                Ok(Some(SettleOutcome::Applied(updated)))
            }
        }
    }
}
