//! PostgreSQL repositories, one per table.
//!
//! Methods taking `&mut PgConnection` are meant to run inside a transaction
//! opened by [`crate::store::PgStore`].

pub mod challenge_repo;
pub mod purchase_repo;
pub mod user_repo;

pub use challenge_repo::ChallengeRepo;
pub use purchase_repo::PurchaseRepo;
pub use user_repo::UserRepo;
