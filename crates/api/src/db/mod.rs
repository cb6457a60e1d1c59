//! Database operations for the Souq `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Accounts, roles, password hashes, reset codes
//! - `categories` / `subcategories` / `brands` - Catalog taxonomy
//! - `products` / `product_subcategories` - Catalog items
//! - `carts` / `cart_items` - User and guest shopping carts
//! - `coupons` - Percentage discounts
//! - `addresses` - User address books
//! - `orders` / `order_items` - Placed orders with item snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p souq-cli -- migrate
//! ```
//!
//! Repositories use the runtime query API (`query_as` + `FromRow` rows) and
//! map rows into the domain models in [`crate::models`].

pub mod addresses;
pub mod brands;
pub mod carts;
pub mod categories;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod subcategories;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
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

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error to `Conflict` when it is a unique violation.
    pub(crate) fn from_unique(e: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
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
