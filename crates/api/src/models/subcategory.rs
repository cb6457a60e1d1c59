//! Subcategory domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{CategoryId, Slug, SubCategoryId};

/// A second-level catalog category, always nested under a [`Category`].
///
/// [`Category`]: super::Category
#[derive(Debug, Clone, Serialize)]
pub struct SubCategory {
    /// Unique subcategory ID.
    pub id: SubCategoryId,
    /// Parent category.
    pub category_id: CategoryId,
    /// Display name (Arabic or Latin).
    pub name: String,
    /// URL slug derived from the name, unique within the parent category.
    pub slug: Slug,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the subcategory was created.
    pub created_at: DateTime<Utc>,
    /// When the subcategory was last updated.
    pub updated_at: DateTime<Utc>,
}

impl SubCategory {
    /// Whether the subcategory is soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
