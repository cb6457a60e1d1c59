//! Brand domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{BrandId, Slug};

/// A product brand.
#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    /// Unique brand ID.
    pub id: BrandId,
    /// Display name.
    pub name: String,
    /// URL slug derived from the name, unique across brands.
    pub slug: Slug,
    /// Optional logo URL (media-storage asset).
    pub image: Option<String>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the brand was created.
    pub created_at: DateTime<Utc>,
    /// When the brand was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// Whether the brand is soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
