//! Address domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{AddressId, UserId};

/// A saved shipping address in a user's address book.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    /// Unique address ID.
    pub id: AddressId,
    /// Owning user.
    pub user_id: UserId,
    /// Short label, unique per user (e.g. "المنزل", "Work").
    pub alias: String,
    /// Street address details.
    pub details: String,
    /// Contact phone for delivery.
    pub phone: String,
    /// City name.
    pub city: String,
    /// Optional postal code.
    pub postal_code: Option<String>,
    /// When the address was created.
    pub created_at: DateTime<Utc>,
    /// When the address was last updated.
    pub updated_at: DateTime<Utc>,
}
