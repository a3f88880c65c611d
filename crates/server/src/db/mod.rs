//! Database operations for the Tavola `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts (customers, restaurant owners, admins)
//! - `restaurants` / `menu_items` - Marketplace catalog
//! - `orders` / `order_items` - Checkout snapshots and delivery status
//! - `promotions` - Discount codes with usage and expiry limits
//! - `tower_sessions.session` - Session storage
//!
//! Repositories use the runtime sqlx query API with explicit row structs so
//! the crate builds without a live database; rows are converted into the
//! domain models in [`crate::models`], failing with
//! [`RepositoryError::DataCorruption`] when stored text does not parse.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tavola-cli -- migrate
//! ```

pub mod orders;
pub mod promotions;
pub mod restaurants;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::OrderRepository;
pub use promotions::PromotionRepository;
pub use restaurants::RestaurantRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
