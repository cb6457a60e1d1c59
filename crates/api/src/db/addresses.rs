//! Address repository.
//!
//! Address books are small and user-scoped, so listing is unpaginated and
//! deletes are hard deletes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use souq_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::Address;

/// Database row for an address.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    alias: String,
    details: String,
    phone: String,
    city: String,
    postal_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        Self {
            id: AddressId::new(r.id),
            user_id: UserId::new(r.user_id),
            alias: r.alias,
            details: r.details,
            phone: r.phone,
            city: r.city,
            postal_code: r.postal_code,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const SELECT: &str = "SELECT id, user_id, alias, details, phone, city, postal_code, \
                      created_at, updated_at FROM addresses";

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(&format!(
            "{SELECT} WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get one of a user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> =
            sqlx::query_as(&format!("{SELECT} WHERE id = $1 AND user_id = $2"))
                .bind(id.as_i32())
                .bind(user_id.as_i32())
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(Address::from))
    }

    /// Add an address to a user's book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the alias is already used by
    /// this user.
    pub async fn create(
        &self,
        user_id: UserId,
        alias: &str,
        details: &str,
        phone: &str,
        city: &str,
        postal_code: Option<&str>,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(
            "INSERT INTO addresses (user_id, alias, details, phone, city, postal_code) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, alias, details, phone, city, postal_code, \
                       created_at, updated_at",
        )
        .bind(user_id.as_i32())
        .bind(alias)
        .bind(details)
        .bind(phone)
        .bind(city)
        .bind(postal_code)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "address alias already exists"))?;

        Ok(row.into())
    }

    /// Update an address. `None` fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist for
    /// this user and `RepositoryError::Conflict` on alias collision.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        alias: Option<&str>,
        details: Option<&str>,
        phone: Option<&str>,
        city: Option<&str>,
        postal_code: Option<&str>,
    ) -> Result<Address, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(
            "UPDATE addresses SET \
                 alias = COALESCE($3, alias), \
                 details = COALESCE($4, details), \
                 phone = COALESCE($5, phone), \
                 city = COALESCE($6, city), \
                 postal_code = COALESCE($7, postal_code), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, alias, details, phone, city, postal_code, \
                       created_at, updated_at",
        )
        .bind(id.as_i32())
        .bind(user_id.as_i32())
        .bind(alias)
        .bind(details)
        .bind(phone)
        .bind(city)
        .bind(postal_code)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "address alias already exists"))?;

        row.map(Address::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete an address.
    ///
    /// # Returns
    ///
    /// Returns `true` if the address was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id.as_i32())
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
