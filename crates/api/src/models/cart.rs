//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use souq_core::{CartId, CartItemId, CouponId, CurrencyCode, ProductId};

use super::ShopperIdentity;

/// A shopping cart belonging to a user or a guest.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Who owns the cart (user XOR guest token).
    pub owner: ShopperIdentity,
    /// Coupon currently applied, if any.
    pub coupon: Option<AppliedCoupon>,
    /// Line items.
    pub items: Vec<CartItem>,
    /// Sum of line prices.
    pub total_price: Decimal,
    /// Total after the applied coupon's discount; absent without a coupon.
    pub total_after_discount: Option<Decimal>,
    /// Currency of all amounts.
    pub currency: CurrencyCode,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }

    /// The amount the shopper pays: discounted total when a coupon applies.
    #[must_use]
    pub fn payable_total(&self) -> Decimal {
        self.total_after_discount.unwrap_or(self.total_price)
    }
}

/// A single cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// Unique line ID.
    pub id: CartItemId,
    /// Product on this line.
    pub product_id: ProductId,
    /// Product title at display time.
    pub title: String,
    /// Units of the product. Always positive.
    pub quantity: i32,
    /// Selected color, when the product has color variants.
    pub color: Option<String>,
    /// Unit price snapshot taken when the line was added.
    pub unit_price: Decimal,
}

impl CartItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Coupon data denormalized onto the cart.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedCoupon {
    /// Coupon ID.
    pub id: CouponId,
    /// Coupon code.
    pub name: String,
    /// Discount percentage, 1-100.
    pub discount_percent: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;
    use souq_core::UserId;

    fn cart_with_items() -> Cart {
        Cart {
            id: CartId::new(1),
            owner: ShopperIdentity::User(UserId::new(1)),
            coupon: None,
            items: vec![
                CartItem {
                    id: CartItemId::new(1),
                    product_id: ProductId::new(10),
                    title: "أحذية رياضية".to_owned(),
                    quantity: 2,
                    color: Some("black".to_owned()),
                    unit_price: dec!(150),
                },
                CartItem {
                    id: CartItemId::new(2),
                    product_id: ProductId::new(11),
                    title: "Socks".to_owned(),
                    quantity: 3,
                    color: None,
                    unit_price: dec!(20),
                },
            ],
            total_price: dec!(360),
            total_after_discount: None,
            currency: CurrencyCode::EGP,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_price() {
        let cart = cart_with_items();
        assert_eq!(cart.items[0].line_price(), dec!(300));
        assert_eq!(cart.items[1].line_price(), dec!(60));
    }

    #[test]
    fn test_item_count() {
        assert_eq!(cart_with_items().item_count(), 5);
    }

    #[test]
    fn test_payable_total_prefers_discounted() {
        let mut cart = cart_with_items();
        assert_eq!(cart.payable_total(), dec!(360));
        cart.total_after_discount = Some(dec!(324));
        assert_eq!(cart.payable_total(), dec!(324));
    }
}
