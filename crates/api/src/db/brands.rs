//! Brand repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use souq_core::{BrandId, Slug};

use super::RepositoryError;
use crate::models::Brand;
use crate::pagination::ListParams;

/// Whitelisted sort keys for brand listings.
const SORT_COLUMNS: &[(&str, &str)] = &[("name", "name"), ("created_at", "created_at")];

/// Database row for a brand.
#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: i32,
    name: String,
    slug: String,
    image: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BrandRow> for Brand {
    fn from(r: BrandRow) -> Self {
        Self {
            id: BrandId::new(r.id),
            name: r.name,
            slug: Slug::from_raw(r.slug),
            image: r.image,
            deleted_at: r.deleted_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT: &str =
    "SELECT id, name, slug, image, deleted_at, created_at, updated_at FROM brands";

/// Repository for brand database operations.
pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &ListParams, staff: bool) {
        qb.push(" WHERE 1=1");
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

    /// List brands with pagination. `staff` unlocks `include_deleted`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        staff: bool,
    ) -> Result<(Vec<Brand>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM brands");
        Self::push_filters(&mut count_qb, params, staff);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::new(SELECT);
        Self::push_filters(&mut qb, params, staff);
        qb.push(" ")
            .push(params.order_by(SORT_COLUMNS, "name ASC"))
            .push(" LIMIT ")
            .push_bind(params.sql_limit())
            .push(" OFFSET ")
            .push_bind(params.sql_offset());

        let rows: Vec<BrandRow> = qb.build_query_as().fetch_all(self.pool).await?;
        Ok((rows.into_iter().map(Brand::from).collect(), total))
    }

    /// Get a brand by slug. Soft-deleted rows are hidden unless `include_deleted`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(
        &self,
        slug: &str,
        include_deleted: bool,
    ) -> Result<Option<Brand>, RepositoryError> {
        let mut qb = QueryBuilder::new(SELECT);
        qb.push(" WHERE slug = ").push_bind(slug);
        if !include_deleted {
            qb.push(" AND deleted_at IS NULL");
        }
        let row: Option<BrandRow> = qb.build_query_as().fetch_optional(self.pool).await?;
        Ok(row.map(Brand::from))
    }

    /// Get a brand by ID, regardless of deletion state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let row: Option<BrandRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Brand::from))
    }

    /// Create a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    pub async fn create(
        &self,
        name: &str,
        slug: &Slug,
        image: Option<&str>,
    ) -> Result<Brand, RepositoryError> {
        let row: BrandRow = sqlx::query_as(
            "INSERT INTO brands (name, slug, image) VALUES ($1, $2, $3) \
             RETURNING id, name, slug, image, deleted_at, created_at, updated_at",
        )
        .bind(name)
        .bind(slug.as_str())
        .bind(image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "brand slug already exists"))?;

        Ok(row.into())
    }

    /// Update a brand. `None` fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand doesn't exist and
    /// `RepositoryError::Conflict` if the new slug collides.
    pub async fn update(
        &self,
        id: BrandId,
        name: Option<&str>,
        slug: Option<&Slug>,
        image: Option<&str>,
    ) -> Result<Brand, RepositoryError> {
        let row: Option<BrandRow> = sqlx::query_as(
            "UPDATE brands SET \
                 name = COALESCE($2, name), \
                 slug = COALESCE($3, slug), \
                 image = COALESCE($4, image), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, slug, image, deleted_at, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(name)
        .bind(slug.map(Slug::as_str))
        .bind(image)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "brand slug already exists"))?;

        row.map(Brand::from).ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no live brand matches.
    pub async fn soft_delete(&self, id: BrandId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE brands SET deleted_at = NOW(), updated_at = NOW() \
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

    /// Restore a soft-deleted brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no deleted brand matches.
    pub async fn restore(&self, id: BrandId) -> Result<Brand, RepositoryError> {
        let row: Option<BrandRow> = sqlx::query_as(
            "UPDATE brands SET deleted_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING id, name, slug, image, deleted_at, created_at, updated_at",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Brand::from).ok_or(RepositoryError::NotFound)
    }
}
