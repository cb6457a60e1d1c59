//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use souq_core::{CurrencyCode, OrderId, OrderStatus, PaymentMethod, ProductId};

use super::ShopperIdentity;

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Who placed the order (user XOR guest token).
    pub owner: ShopperIdentity,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// How the order is paid.
    pub payment_method: PaymentMethod,
    /// Shipping address snapshot taken at checkout.
    pub shipping: ShippingAddress,
    /// Item snapshots.
    pub items: Vec<OrderItem>,
    /// Sum of line prices after cart discount.
    pub items_price: Decimal,
    /// Tax charged.
    pub tax_price: Decimal,
    /// Shipping charged.
    pub shipping_price: Decimal,
    /// Grand total: items + tax + shipping.
    pub total_price: Decimal,
    /// Currency of all amounts.
    pub currency: CurrencyCode,
    /// Whether payment has been collected.
    pub is_paid: bool,
    /// When payment was collected.
    pub paid_at: Option<DateTime<Utc>>,
    /// Whether the order has been delivered.
    pub is_delivered: bool,
    /// When the order was delivered.
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Shipping address snapshot embedded in an order.
///
/// Copied from the user's address book (or a guest-provided address) at
/// checkout so later address edits never rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street address details.
    pub details: String,
    /// Contact phone for delivery.
    pub phone: String,
    /// City name.
    pub city: String,
    /// Optional postal code.
    pub postal_code: Option<String>,
}

/// A product snapshot on an order line.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// Product that was ordered.
    pub product_id: ProductId,
    /// Product title at checkout time.
    pub title: String,
    /// Units ordered. Always positive.
    pub quantity: i32,
    /// Selected color, when applicable.
    pub color: Option<String>,
    /// Unit price at checkout time.
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
