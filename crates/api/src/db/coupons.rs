//! Coupon repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use souq_core::CouponId;

use super::RepositoryError;
use crate::models::Coupon;
use crate::pagination::ListParams;

/// Whitelisted sort keys for coupon listings.
const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("expires_at", "expires_at"),
    ("created_at", "created_at"),
];

/// Database row for a coupon.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    name: String,
    discount_percent: i32,
    expires_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(r: CouponRow) -> Self {
        Self {
            id: CouponId::new(r.id),
            name: r.name,
            discount_percent: r.discount_percent,
            expires_at: r.expires_at,
            deleted_at: r.deleted_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT: &str = "SELECT id, name, discount_percent, expires_at, deleted_at, \
                      created_at, updated_at FROM coupons";

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &ListParams) {
        qb.push(" WHERE 1=1");
        if !params.include_deleted() {
            qb.push(" AND deleted_at IS NULL");
        }
        if let Some(pattern) = params.keyword_pattern() {
            qb.push(" AND name ILIKE ").push_bind(pattern);
        }
    }

    /// List coupons with pagination (staff only, so `include_deleted` is honored).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, params: &ListParams) -> Result<(Vec<Coupon>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM coupons");
        Self::push_filters(&mut count_qb, params);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::new(SELECT);
        Self::push_filters(&mut qb, params);
        qb.push(" ")
            .push(params.order_by(SORT_COLUMNS, "expires_at ASC"))
            .push(" LIMIT ")
            .push_bind(params.sql_limit())
            .push(" OFFSET ")
            .push_bind(params.sql_offset());

        let rows: Vec<CouponRow> = qb.build_query_as().fetch_all(self.pool).await?;
        Ok((rows.into_iter().map(Coupon::from).collect(), total))
    }

    /// Get a coupon by ID, regardless of deletion state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!("{SELECT} WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Coupon::from))
    }

    /// Get a coupon by code. Codes are stored uppercase; lookup is
    /// case-insensitive. Soft-deleted coupons are not returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row: Option<CouponRow> =
            sqlx::query_as(&format!("{SELECT} WHERE name = $1 AND deleted_at IS NULL"))
                .bind(name.trim().to_uppercase())
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(Coupon::from))
    }

    /// Create a coupon. The code is stored uppercase.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    pub async fn create(
        &self,
        name: &str,
        discount_percent: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Coupon, RepositoryError> {
        let row: CouponRow = sqlx::query_as(
            "INSERT INTO coupons (name, discount_percent, expires_at) VALUES ($1, $2, $3) \
             RETURNING id, name, discount_percent, expires_at, deleted_at, created_at, updated_at",
        )
        .bind(name.trim().to_uppercase())
        .bind(discount_percent)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "coupon code already exists"))?;

        Ok(row.into())
    }

    /// Update a coupon. `None` fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist and
    /// `RepositoryError::Conflict` if the new code collides.
    pub async fn update(
        &self,
        id: CouponId,
        name: Option<&str>,
        discount_percent: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Coupon, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(
            "UPDATE coupons SET \
                 name = COALESCE($2, name), \
                 discount_percent = COALESCE($3, discount_percent), \
                 expires_at = COALESCE($4, expires_at), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, name, discount_percent, expires_at, deleted_at, created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(name.map(|n| n.trim().to_uppercase()))
        .bind(discount_percent)
        .bind(expires_at)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "coupon code already exists"))?;

        row.map(Coupon::from).ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no live coupon matches.
    pub async fn soft_delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE coupons SET deleted_at = NOW(), updated_at = NOW() \
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

    /// Restore a soft-deleted coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no deleted coupon matches.
    pub async fn restore(&self, id: CouponId) -> Result<Coupon, RepositoryError> {
        let row: Option<CouponRow> = sqlx::query_as(
            "UPDATE coupons SET deleted_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NOT NULL \
             RETURNING id, name, discount_percent, expires_at, deleted_at, created_at, updated_at",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::from).ok_or(RepositoryError::NotFound)
    }
}
