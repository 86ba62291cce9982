//! In-process [`Store`](crate::Store) for tests and database-less development.
//!
//! All state sits behind one mutex, so every trait method is atomic in the
//! same sense as the transactional PostgreSQL implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use marketgate_core::identity::normalize_email;
use marketgate_core::payment::{decide_transition, PurchaseStatus, Transition};
use marketgate_core::roles::UserRole;
use marketgate_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::challenge::{CreateChallenge, PhoneChallenge};
use crate::models::purchase::{CreatePurchase, Purchase};
use crate::models::user::{CreateUser, LinkIdentity, User};
use crate::store::{
    ChallengeStore, PurchaseStore, SettleOutcome, StoreError, StoreResult, UserStore,
};

#[derive(Default)]
struct State {
    users: HashMap<DbId, User>,
    challenges: HashMap<DbId, PhoneChallenge>,
    purchases: HashMap<String, Purchase>,
}

impl State {
    fn user_by_email(&self, email: &str) -> Option<&User> {
        let wanted = normalize_email(email);
        self.users
            .values()
            .find(|u| normalize_email(&u.email) == wanted)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a user's premium flag. Intended for seeding test fixtures.
    pub async fn set_premium(&self, id: DbId, is_premium: bool) {
        if let Some(user) = self.state.lock().await.users.get_mut(&id) {
            user.is_premium = is_premium;
        }
    }

    /// Overwrite a user's role. Intended for seeding test fixtures.
    pub async fn set_role(&self, id: DbId, role: UserRole) {
        if let Some(user) = self.state.lock().await.users.get_mut(&id) {
            user.role = role;
        }
    }

    /// Number of stored challenges, verified or not.
    pub async fn challenge_count(&self) -> usize {
        self.state.lock().await.challenges.len()
    }

    /// Move a challenge's expiry. Intended for simulating the passage of time.
    pub async fn set_challenge_expiry(&self, id: DbId, expires_at: Timestamp) {
        if let Some(challenge) = self.state.lock().await.challenges.get_mut(&id) {
            challenge.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.user_by_email(email).cloned())
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state.user_by_email(&input.email).is_some() {
            return Err(StoreError::Duplicate("email"));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: input.email.clone(),
            name: input.name.clone(),
            avatar_url: input.avatar_url.clone(),
            password_hash: input.password_hash.clone(),
            phone_number: None,
            is_phone_verified: false,
            role: UserRole::Unset,
            is_premium: false,
            identity_provider: input.identity_provider,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn link_identity(&self, id: DbId, link: &LinkIdentity) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        user.identity_provider = link.identity_provider;
        if user.name.is_none() {
            user.name = link.name.clone();
        }
        if link.avatar_url.is_some() {
            user.avatar_url = link.avatar_url.clone();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_role_if_unset(&self, id: DbId, role: UserRole) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&id) {
            Some(user) if user.role == UserRole::Unset => {
                user.role = role;
                user.updated_at = Utc::now();
                Ok(Some(user.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn replace_challenge(
        &self,
        input: &CreateChallenge,
        now: Timestamp,
    ) -> StoreResult<PhoneChallenge> {
        let mut state = self.state.lock().await;
        state.challenges.retain(|_, c| {
            let expired = c.expires_at < now;
            let superseded = !c.verified
                && c.user_id == input.user_id
                && c.phone_number == input.phone_number;
            !expired && !superseded
        });
        let challenge = PhoneChallenge {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            phone_number: input.phone_number.clone(),
            code: input.code.clone(),
            expires_at: input.expires_at,
            verified: false,
            created_at: now,
        };
        state.challenges.insert(challenge.id, challenge.clone());
        Ok(challenge)
    }

    async fn find_pending_challenge(
        &self,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<PhoneChallenge>> {
        let state = self.state.lock().await;
        Ok(state
            .challenges
            .values()
            .filter(|c| !c.verified && c.user_id == user_id && c.phone_number == phone_number)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn delete_challenge(&self, id: DbId) -> StoreResult<()> {
        self.state.lock().await.challenges.remove(&id);
        Ok(())
    }

    async fn complete_challenge(
        &self,
        challenge_id: DbId,
        user_id: DbId,
        phone_number: &str,
    ) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        let pending = matches!(state.challenges.get(&challenge_id), Some(c) if !c.verified);
        if !pending || !state.users.contains_key(&user_id) {
            return Ok(None);
        }
        if let Some(challenge) = state.challenges.get_mut(&challenge_id) {
            challenge.verified = true;
        }
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };
        user.phone_number = Some(phone_number.to_string());
        user.is_phone_verified = true;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl PurchaseStore for MemoryStore {
    async fn create_purchase(&self, input: &CreatePurchase) -> StoreResult<Purchase> {
        let mut state = self.state.lock().await;
        if state.purchases.contains_key(&input.merchant_oid) {
            return Err(StoreError::Duplicate("merchant_oid"));
        }
        let now = Utc::now();
        let purchase = Purchase {
            id: Uuid::new_v4(),
            merchant_oid: input.merchant_oid.clone(),
            user_id: input.user_id,
            plan_id: input.plan_id,
            amount_minor: input.amount_minor,
            currency: input.currency.clone(),
            status: PurchaseStatus::Pending,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        state
            .purchases
            .insert(purchase.merchant_oid.clone(), purchase.clone());
        Ok(purchase)
    }

    async fn find_purchase(&self, merchant_oid: &str) -> StoreResult<Option<Purchase>> {
        Ok(self.state.lock().await.purchases.get(merchant_oid).cloned())
    }

    async fn settle_purchase(
        &self,
        merchant_oid: &str,
        status: PurchaseStatus,
        failure_reason: Option<&str>,
    ) -> StoreResult<Option<SettleOutcome>> {
        let mut state = self.state.lock().await;
        let Some(current) = state.purchases.get(merchant_oid).cloned() else {
            return Ok(None);
        };

        match decide_transition(current.status, status)? {
            Transition::Duplicate => Ok(Some(SettleOutcome::AlreadyApplied(current))),
            Transition::Conflict => Ok(Some(SettleOutcome::Conflict(current))),
            Transition::Apply => {
                let now = Utc::now();
                let mut updated = current;
                updated.status = status;
                updated.failure_reason = failure_reason.map(str::to_string);
                updated.updated_at = now;
                state
                    .purchases
                    .insert(updated.merchant_oid.clone(), updated.clone());
                if status == PurchaseStatus::Success {
                    if let Some(user) = state.users.get_mut(&updated.user_id) {
                        user.is_premium = true;
                        user.updated_at = now;
                    }
                }
                Ok(Some(SettleOutcome::Applied(updated)))
            }
        }
    }
}
