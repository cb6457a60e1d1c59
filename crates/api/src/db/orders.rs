//! Order repository.
//!
//! Order creation is transactional: stock is decremented with an in-query
//! guard, item snapshots are copied from the cart, and the cart is deleted,
//! all or nothing. Status transitions lock the order row first so concurrent
//! admin actions cannot double-apply.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use souq_core::{CurrencyCode, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, Order, OrderItem, ShippingAddress, ShopperIdentity};
use crate::pagination::ListParams;

/// Whitelisted sort keys for order listings.
const SORT_COLUMNS: &[(&str, &str)] = &[
    ("created_at", "created_at"),
    ("total_price", "total_price"),
    ("status", "status"),
];

/// Pricing summary for a new order, computed by the order service.
#[derive(Debug, Clone)]
pub struct NewOrderPricing {
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub currency: CurrencyCode,
}

/// Database row for an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: Option<i32>,
    guest_token: Option<Uuid>,
    status: String,
    payment_method: String,
    shipping_details: String,
    shipping_phone: String,
    shipping_city: String,
    shipping_postal_code: Option<String>,
    items_price: Decimal,
    tax_price: Decimal,
    shipping_price: Decimal,
    total_price: Decimal,
    currency: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let owner = match (self.user_id, self.guest_token) {
            (Some(user_id), None) => ShopperIdentity::User(UserId::new(user_id)),
            (None, Some(token)) => ShopperIdentity::Guest(token),
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "order {} has invalid owner columns",
                    self.id
                )));
            }
        };
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status: {e}"))
        })?;
        let payment_method = self.payment_method.parse::<PaymentMethod>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment method: {e}"))
        })?;
        let currency = CurrencyCode::from_code(&self.currency).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown currency code: {}", self.currency))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            owner,
            status,
            payment_method,
            shipping: ShippingAddress {
                details: self.shipping_details,
                phone: self.shipping_phone,
                city: self.shipping_city,
                postal_code: self.shipping_postal_code,
            },
            items,
            items_price: self.items_price,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            currency,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row for an order line.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: i32,
    title: String,
    quantity: i32,
    color: Option<String>,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        Self {
            product_id: ProductId::new(r.product_id),
            title: r.title,
            quantity: r.quantity,
            color: r.color,
            unit_price: r.unit_price,
        }
    }
}

const COLUMNS: &str = "id, user_id, guest_token, status, payment_method, \
                       shipping_details, shipping_phone, shipping_city, shipping_postal_code, \
                       items_price, tax_price, shipping_price, total_price, currency, \
                       is_paid, paid_at, is_delivered, delivered_at, created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order from a cart.
    ///
    /// In one transaction: decrements product stock (guarded, so overselling
    /// fails the whole checkout), inserts the order with item snapshots, and
    /// deletes the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any product lacks stock and
    /// `RepositoryError::Database` for other failures.
    pub async fn create_from_cart(
        &self,
        cart: &Cart,
        payment_method: PaymentMethod,
        shipping: &ShippingAddress,
        pricing: &NewOrderPricing,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Reserve stock line by line; a failed guard aborts the checkout.
        for item in &cart.items {
            let result = sqlx::query(
                "UPDATE products SET quantity = quantity - $2, sold = sold + $2, \
                     updated_at = NOW() \
                 WHERE id = $1 AND deleted_at IS NULL AND quantity >= $2",
            )
            .bind(item.product_id.as_i32())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "insufficient stock for product {}",
                    item.product_id
                )));
            }
        }

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (user_id, guest_token, payment_method, \
                 shipping_details, shipping_phone, shipping_city, shipping_postal_code, \
                 items_price, tax_price, shipping_price, total_price, currency) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        ))
        .bind(cart.owner.user_id().map(|u| u.as_i32()))
        .bind(cart.owner.guest_token())
        .bind(payment_method.as_str())
        .bind(&shipping.details)
        .bind(&shipping.phone)
        .bind(&shipping.city)
        .bind(shipping.postal_code.as_deref())
        .bind(pricing.items_price)
        .bind(pricing.tax_price)
        .bind(pricing.shipping_price)
        .bind(pricing.total_price)
        .bind(pricing.currency.code())
        .fetch_one(&mut *tx)
        .await?;

        for item in &cart.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, title, quantity, color, unit_price) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(row.id)
            .bind(item.product_id.as_i32())
            .bind(&item.title)
            .bind(item.quantity)
            .bind(item.color.as_deref())
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(cart.id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let items = cart
            .items
            .iter()
            .map(|i| OrderItem {
                product_id: i.product_id,
                title: i.title.clone(),
                quantity: i.quantity,
                color: i.color.clone(),
                unit_price: i.unit_price,
            })
            .collect();
        row.into_order(items)
    }

    /// List orders, newest first by default. `owner` scopes to one shopper;
    /// staff pass `None` to see everything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        owner: Option<ShopperIdentity>,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let push_owner = |qb: &mut QueryBuilder<'_, Postgres>| {
            qb.push(" WHERE 1=1");
            match owner {
                Some(ShopperIdentity::User(user_id)) => {
                    qb.push(" AND user_id = ").push_bind(user_id.as_i32());
                }
                Some(ShopperIdentity::Guest(token)) => {
                    qb.push(" AND guest_token = ").push_bind(token);
                }
                None => {}
            }
        };

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM orders");
        push_owner(&mut count_qb);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM orders"));
        push_owner(&mut qb);
        qb.push(" ")
            .push(params.order_by(SORT_COLUMNS, "created_at DESC"))
            .push(" LIMIT ")
            .push_bind(params.sql_limit())
            .push(" OFFSET ")
            .push_bind(params.sql_offset());

        let rows: Vec<OrderRow> = qb.build_query_as().fetch_all(self.pool).await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, product_id, title, quantity, color, unit_price \
             FROM order_items WHERE order_id = ANY($1) ORDER BY id ASC",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut items_by_order: std::collections::HashMap<i32, Vec<OrderItem>> =
            std::collections::HashMap::new();
        for item in item_rows {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(item.into());
        }

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            orders.push(row.into_order(items)?);
        }
        Ok((orders, total))
    }

    /// Get an order by ID with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, product_id, title, quantity, color, unit_price \
             FROM order_items WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        let items = item_rows.into_iter().map(OrderItem::from).collect();
        Ok(Some(row.into_order(items)?))
    }

    async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
    ) -> Result<(String, bool), RepositoryError> {
        let row: Option<(String, bool)> =
            sqlx::query_as("SELECT status, is_paid FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut **tx)
                .await?;
        row.ok_or(RepositoryError::NotFound)
    }

    /// Mark an order as paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist and
    /// `RepositoryError::Conflict` if it is already paid or cancelled.
    pub async fn mark_paid(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let (status, is_paid) = Self::lock_status(&mut tx, id).await?;

        if is_paid {
            return Err(RepositoryError::Conflict("order is already paid".to_owned()));
        }
        if status == OrderStatus::Cancelled.as_str() {
            return Err(RepositoryError::Conflict("order is cancelled".to_owned()));
        }

        sqlx::query(
            "UPDATE orders SET is_paid = TRUE, paid_at = NOW(), status = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(OrderStatus::Processing.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Mark an order as delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist and
    /// `RepositoryError::Conflict` if it is already delivered or cancelled.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let (status, _) = Self::lock_status(&mut tx, id).await?;

        if status == OrderStatus::Delivered.as_str() {
            return Err(RepositoryError::Conflict(
                "order is already delivered".to_owned(),
            ));
        }
        if status == OrderStatus::Cancelled.as_str() {
            return Err(RepositoryError::Conflict("order is cancelled".to_owned()));
        }

        sqlx::query(
            "UPDATE orders SET is_delivered = TRUE, delivered_at = NOW(), status = $2, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(OrderStatus::Delivered.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Cancel an order and restock its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist and
    /// `RepositoryError::Conflict` if it was already delivered or cancelled.
    pub async fn cancel(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let (status, _) = Self::lock_status(&mut tx, id).await?;

        if status == OrderStatus::Delivered.as_str() || status == OrderStatus::Cancelled.as_str() {
            return Err(RepositoryError::Conflict(format!(
                "cannot cancel a {status} order"
            )));
        }

        sqlx::query(
            "UPDATE products p SET quantity = p.quantity + oi.quantity, \
                 sold = p.sold - oi.quantity, updated_at = NOW() \
             FROM order_items oi \
             WHERE oi.order_id = $1 AND p.id = oi.product_id",
        )
        .bind(id.as_i32())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .bind(OrderStatus::Cancelled.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }
}
