//! Subcategory repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use souq_core::{CategoryId, Slug, SubCategoryId};

use super::RepositoryError;
use crate::models::SubCategory;
use crate::pagination::ListParams;

/// Whitelisted sort keys for subcategory listings.
const SORT_COLUMNS: &[(&str, &str)] = &[("name", "name"), ("created_at", "created_at")];

/// Database row for a subcategory.
#[derive(Debug, sqlx::FromRow)]
struct SubCategoryRow {
    id: i32,
    category_id: i32,
    name: String,
    slug: String,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubCategoryRow> for SubCategory {
    fn from(r: SubCategoryRow) -> Self {
        Self {
            id: SubCategoryId::new(r.id),
            category_id: CategoryId::new(r.category_id),
            name: r.name,
            slug: Slug::from_raw(r.slug),
            deleted_at: r.deleted_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT: &str = "SELECT id, category_id, name, slug, deleted_at, created_at, updated_at \
                      FROM subcategories";

/// Repository for subcategory database operations.
pub struct SubCategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubCategoryRepository<'a> {
    /// Create a new subcategory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        params: &ListParams,
        category: Option<CategoryId>,
        staff: bool,
    ) {
        qb.push(" WHERE 1=1");
        if let Some(category_id) = category {
            qb.push(" AND category_id = ").push_bind(category_id.as_i32());
        }
        if !(staff && params.include_deleted()) {
            qb.push(" AND deleted_at IS NULL");
        }
        if let Some(pattern) = params.keyword_pattern() {
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR slug ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// List subcategories, optionally scoped to a parent category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        category: Option<CategoryId>,
        staff: bool,
    ) -> Result<(Vec<SubCategory>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM subcategories");
        Self::push_filters(&mut count_qb, params, category, staff);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::new(SELECT);
        Self::push_filters(&mut qb, params, category, staff);
        qb.push(" ")
            .push(params.order_by(SORT_COLUMNS, "name ASC"))
            .push(" LIMIT ")
            .push_bind(params.sql_limit())
            .push(" OFFSET ")
            .push_bind(params.sql_offset());

        let rows: Vec<SubCategoryRow> = qb.build_query_as().fetch_all(self.pool).await?;
        Ok((rows.into_iter().map(SubCategory::from).collect(), total))
    }

    /// Get a subcategory by slug within a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(
        &self,
        category_id: CategoryId,
        slug: &str,
        include_deleted: bool,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push(" WHERE category_id = ")
            .push_bind(category_id.as_i32())
            .push(" AND slug = ")
            .push_bind(slug);
        if !include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        let row: Option<SubCategoryRow> = qb.build_query_as().fetch_optional(self.pool).await?;
        Ok(row.map(SubCategory::from))
    }

    /// Get a subcategory by ID, regardless of deletion state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: SubCategoryId,
    ) -> Result<Option<SubCategory>, RepositoryError> {
        let row: Option<SubCategoryRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(SubCategory::from))
    }

    /// Create a subcategory under a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists in the
    /// category and `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn create(
        &self,
        category_id: CategoryId,
        name: &str,
        slug: &Slug,
    ) -> Result<SubCategory, RepositoryError> {
        let row: SubCategoryRow = sqlx::query_as(
            "INSERT INTO subcategories (category_id, name, slug) VALUES ($1, $2, $3) \
             RETURNING id, category_id, name, slug, deleted_at, created_at, updated_at",
        )
        .bind(category_id.as_i32())
        .bind(name)
        .bind(slug.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::from_unique(e, "subcategory slug already exists in this category")
        })?;

        Ok(row.into())
    }

    /// Update a subcategory. `None` fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subcategory doesn't exist and
    /// `RepositoryError::Conflict` if the new slug collides.
    pub async fn update(
        &self,
        id: SubCategoryId,
        name: Option<&str>,
        slug: Option<&Slug>,
        category_id: Option<CategoryId>,
    ) -> Result<SubCategory, RepositoryError> {
        let row: Option<SubCategoryRow> = sqlx::query_as(
            "UPDATE subcategories SET \
                 name = COALESCE($2, name), \
                 slug = COALESCE($3, slug), \
                 category_id = COALESCE($4, category_id), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, category_id, name, slug, deleted_at, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(name)
        .bind(slug.map(Slug::as_str))
        .bind(category_id.map(|c| c.as_i32()))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_unique(e, "subcategory slug already exists in this category")
        })?;

        row.map(SubCategory::from).ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a subcategory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no live subcategory matches.
    pub async fn soft_delete(&self, id: SubCategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE subcategories SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Restore a soft-deleted subcategory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no deleted subcategory matches.
    pub async fn restore(&self, id: SubCategoryId) -> Result<SubCategory, RepositoryError> {
        let row: Option<SubCategoryRow> = sqlx::query_as(
            "UPDATE subcategories SET deleted_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING id, category_id, name, slug, deleted_at, created_at, updated_at",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(SubCategory::from).ok_or(RepositoryError::NotFound)
    }
}
