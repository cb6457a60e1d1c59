//! Cart repository.
//!
//! Carts are keyed by owner: an authenticated user or an anonymous guest
//! token, never both (enforced by a CHECK constraint and reasserted when
//! mapping rows). A line is unique per (cart, product, color); re-adding the
//! same product/color sums quantities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use souq_core::{CartId, CartItemId, CouponId, CurrencyCode, ProductId, UserId};

use super::RepositoryError;
use crate::models::{AppliedCoupon, Cart, CartItem, ShopperIdentity};

/// Database row for a cart.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: Option<i32>,
    guest_token: Option<Uuid>,
    coupon_id: Option<i32>,
    total_price: Decimal,
    total_after_discount: Option<Decimal>,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn owner(&self) -> Result<ShopperIdentity, RepositoryError> {
        match (self.user_id, self.guest_token) {
            (Some(user_id), None) => Ok(ShopperIdentity::User(UserId::new(user_id))),
            (None, Some(token)) => Ok(ShopperIdentity::Guest(token)),
            _ => Err(RepositoryError::DataCorruption(format!(
                "cart {} has invalid owner columns",
                self.id
            ))),
        }
    }
}

/// Database row for a cart line (product title joined in).
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    product_id: i32,
    title: String,
    quantity: i32,
    color: Option<String>,
    unit_price: Decimal,
}

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(r.id),
            product_id: ProductId::new(r.product_id),
            title: r.title,
            quantity: r.quantity,
            color: r.color,
            unit_price: r.unit_price,
        }
    }
}

const SELECT: &str = "SELECT id, user_id, guest_token, coupon_id, total_price, \
                      total_after_discount, currency, created_at, updated_at FROM carts";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the owner's cart with items and applied coupon, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for(
        &self,
        owner: ShopperIdentity,
    ) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> = match owner {
            ShopperIdentity::User(user_id) => {
                sqlx::query_as(&format!("{SELECT} WHERE user_id = $1"))
                    .bind(user_id.as_i32())
                    .fetch_optional(self.pool)
                    .await?
            }
            ShopperIdentity::Guest(token) => {
                sqlx::query_as(&format!("{SELECT} WHERE guest_token = $1"))
                    .bind(token)
                    .fetch_optional(self.pool)
                    .await?
            }
        };

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    /// Get the owner's cart, creating an empty one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, owner: ShopperIdentity) -> Result<Cart, RepositoryError> {
        if let Some(cart) = self.get_for(owner).await? {
            return Ok(cart);
        }

        let row: Option<CartRow> = sqlx::query_as(
            "INSERT INTO carts (user_id, guest_token) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING \
             RETURNING id, user_id, guest_token, coupon_id, total_price, \
                       total_after_discount, currency, created_at, updated_at",
        )
        .bind(owner.user_id().map(|u| u.as_i32()))
        .bind(owner.guest_token())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.assemble(row).await,
            // Lost a concurrent-insert race; the owner's cart now exists.
            None => self.get_for(owner).await?.ok_or(RepositoryError::NotFound),
        }
    }

    async fn assemble(&self, row: CartRow) -> Result<Cart, RepositoryError> {
        let owner = row.owner()?;
        let currency = CurrencyCode::from_code(&row.currency).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown currency code: {}", row.currency))
        })?;

        let item_rows: Vec<CartItemRow> = sqlx::query_as(
            "SELECT ci.id, ci.product_id, p.title, ci.quantity, ci.color, ci.unit_price \
             FROM cart_items ci JOIN products p ON p.id = ci.product_id \
             WHERE ci.cart_id = $1 ORDER BY ci.id ASC",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        let coupon = match row.coupon_id {
            Some(coupon_id) => {
                let c: Option<(i32, String, i32)> = sqlx::query_as(
                    "SELECT id, name, discount_percent FROM coupons WHERE id = $1",
                )
                .bind(coupon_id)
                .fetch_optional(self.pool)
                .await?;
                c.map(|(id, name, discount_percent)| AppliedCoupon {
                    id: CouponId::new(id),
                    name,
                    discount_percent,
                })
            }
            None => None,
        };

        Ok(Cart {
            id: CartId::new(row.id),
            owner,
            coupon,
            items: item_rows.into_iter().map(CartItem::from).collect(),
            total_price: row.total_price,
            total_after_discount: row.total_after_discount,
            currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Add units of a product to a cart, summing quantities for an existing
    /// (product, color) line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        color: Option<&str>,
        unit_price: Decimal,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity, color, unit_price) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (cart_id, product_id, (COALESCE(color, ''))) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .bind(color)
        .bind(unit_price)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in this cart.
    pub async fn update_item_quantity(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE id = $2 AND cart_id = $1",
        )
        .bind(cart_id.as_i32())
        .bind(item_id.as_i32())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in this cart.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $2 AND cart_id = $1")
            .bind(cart_id.as_i32())
            .bind(item_id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line (and any applied coupon) from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_i32())
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE carts SET coupon_id = NULL, total_price = 0, \
                 total_after_discount = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(cart_id.as_i32())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Attach (or detach with `None`) a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    pub async fn set_coupon(
        &self,
        cart_id: CartId,
        coupon_id: Option<CouponId>,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE carts SET coupon_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(cart_id.as_i32())
                .bind(coupon_id.map(|c| c.as_i32()))
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Persist recomputed totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    pub async fn save_totals(
        &self,
        cart_id: CartId,
        total_price: Decimal,
        total_after_discount: Option<Decimal>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE carts SET total_price = $2, total_after_discount = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(cart_id.as_i32())
        .bind(total_price)
        .bind(total_after_discount)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a cart and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(cart_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Move every line of `source` into `target` (summing duplicate lines)
    /// and delete `source`. Runs in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn merge(&self, source: CartId, target: CartId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity, color, unit_price) \
             SELECT $2, product_id, quantity, color, unit_price \
             FROM cart_items WHERE cart_id = $1 \
             ON CONFLICT (cart_id, product_id, (COALESCE(color, ''))) \
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(source.as_i32())
        .bind(target.as_i32())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(source.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
