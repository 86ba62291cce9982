//! Repository for the `phone_challenges` table.

use marketgate_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::challenge::{CreateChallenge, PhoneChallenge};

const COLUMNS: &str = "id, user_id, phone_number, code, expires_at, verified, created_at";

pub struct ChallengeRepo;

impl ChallengeRepo {
    /// Insert a new unverified challenge.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateChallenge,
    ) -> Result<PhoneChallenge, sqlx::Error> {
        let query = format!(
            "INSERT INTO phone_challenges (id, user_id, phone_number, code, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhoneChallenge>(&query)
            .bind(Uuid::new_v4())
            .bind(input.user_id)
            .bind(&input.phone_number)
            .bind(&input.code)
            .bind(input.expires_at)
            .fetch_one(conn)
            .await
    }

    /// Serialize challenge writes for one (user, phone) pair until the
    /// transaction ends.
    pub async fn lock_pair(
        conn: &mut PgConnection,
        user_id: DbId,
        phone_number: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{user_id}:{phone_number}"))
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Delete every unverified challenge for a (user, phone) pair.
    pub async fn supersede_pending(
        conn: &mut PgConnection,
        user_id: DbId,
        phone_number: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM phone_challenges
             WHERE user_id = $1 AND phone_number = $2 AND verified = false",
        )
        .bind(user_id)
        .bind(phone_number)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every challenge whose expiry has passed, submitted or not.
    pub async fn purge_expired(conn: &mut PgConnection, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM phone_challenges WHERE expires_at < $1")
            .bind(now)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Most recent unverified challenge for a (user, phone) pair.
    pub async fn find_pending(
        pool: &PgPool,
        user_id: DbId,
        phone_number: &str,
    ) -> Result<Option<PhoneChallenge>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM phone_challenges
             WHERE user_id = $1 AND phone_number = $2 AND verified = false
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PhoneChallenge>(&query)
            .bind(user_id)
            .bind(phone_number)
            .fetch_optional(pool)
            .await
    }

    /// Delete one challenge. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM phone_challenges WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip `verified` exactly once. Returns `false` if it was already set or
    /// the row is gone.
    pub async fn mark_verified(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE phone_challenges SET verified = true WHERE id = $1 AND verified = false",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
