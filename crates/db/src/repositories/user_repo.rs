//! Repository for the `users` table.

use marketgate_core::roles::UserRole;
use marketgate_core::types::DbId;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::user::{CreateUser, LinkIdentity, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, name, avatar_url, password_hash, phone_number, \
                       is_phone_verified, role, is_premium, identity_provider, \
                       created_at, updated_at";

/// Provides lookups and guarded updates for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user with role `unset`, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, email, name, avatar_url, password_hash, identity_provider)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.avatar_url)
            .bind(&input.password_hash)
            .bind(input.identity_provider.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive, matches the unique index).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Record a third-party sign-in on an existing user.
    ///
    /// Overwrites the provider, fills the name only if none is stored, and
    /// replaces the avatar when one is supplied.
    pub async fn link_identity(
        pool: &PgPool,
        id: DbId,
        link: &LinkIdentity,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                identity_provider = $2,
                name = COALESCE(name, $3),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(link.identity_provider.as_str())
            .bind(&link.name)
            .bind(&link.avatar_url)
            .fetch_optional(pool)
            .await
    }

    /// Move a user from `unset` to `role`.
    ///
    /// Returns `None` when the user does not exist or already has a role.
    pub async fn set_role_if_unset(
        pool: &PgPool,
        id: DbId,
        role: UserRole,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET role = $2, updated_at = NOW()
             WHERE id = $1 AND role = 'unset'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Store a verified phone number on the user.
    pub async fn mark_phone_verified(
        conn: &mut PgConnection,
        id: DbId,
        phone_number: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET phone_number = $2, is_phone_verified = true, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(phone_number)
            .fetch_optional(conn)
            .await
    }

    /// Turn on the premium entitlement. Returns `true` if the row was updated.
    pub async fn grant_premium(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_premium = true, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
