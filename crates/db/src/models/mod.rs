pub mod challenge;
pub mod purchase;
pub mod user;
