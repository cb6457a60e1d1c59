//! Category domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{CategoryId, Slug};

/// A top-level catalog category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name (Arabic or Latin).
    pub name: String,
    /// URL slug derived from the name, unique across categories.
    pub slug: Slug,
    /// Optional image URL (media-storage asset).
    pub image: Option<String>,
    /// Soft-delete marker. `Some` = hidden from public listings.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Whether the category is soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
