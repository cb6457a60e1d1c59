//! Cart service.
//!
//! Orchestrates cart reads and mutations: stock and color checks against the
//! live product, price snapshots, coupon application, total recomputation,
//! and the guest-to-user merge that runs when a shopper logs in.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use souq_core::{CartItemId, CurrencyCode, Price, ProductId, UserId};

use crate::db::carts::CartRepository;
use crate::db::coupons::CouponRepository;
use crate::db::products::ProductRepository;
use crate::error::ApiError;
use crate::models::{AppliedCoupon, Cart, CartItem, ShopperIdentity};

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
    coupons: CouponRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
            coupons: CouponRepository::new(pool),
        }
    }

    /// Get the shopper's cart, creating an empty one if needed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Database` if a query fails.
    pub async fn get_cart(&self, owner: ShopperIdentity) -> Result<Cart, ApiError> {
        Ok(self.carts.get_or_create(owner).await?)
    }

    /// Add units of a product to the shopper's cart.
    ///
    /// Validates the product is live, the color (if given) is offered, and
    /// stock covers the requested line quantity. The unit price is snapshotted
    /// from the product's current effective price.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown products,
    /// `ApiError::BadRequest` for unoffered colors, and `ApiError::Conflict`
    /// when stock is insufficient.
    pub async fn add_item(
        &self,
        owner: ShopperIdentity,
        product_id: ProductId,
        quantity: i32,
        color: Option<&str>,
    ) -> Result<Cart, ApiError> {
        let product = self
            .products
            .get_by_id(product_id)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| ApiError::NotFound(format!("product {product_id}")))?;

        if let Some(color) = color
            && !product.colors.iter().any(|c| c == color)
        {
            return Err(ApiError::BadRequest(format!(
                "color '{color}' is not offered for this product"
            )));
        }

        let cart = self.carts.get_or_create(owner).await?;

        // The line may already hold units; the guard covers the summed quantity.
        let existing: i32 = cart
            .items
            .iter()
            .filter(|i| i.product_id == product_id && i.color.as_deref() == color)
            .map(|i| i.quantity)
            .sum();
        if !product.has_stock(existing + quantity) {
            return Err(ApiError::Conflict(format!(
                "only {} units in stock",
                product.quantity
            )));
        }

        self.carts
            .add_item(
                cart.id,
                product_id,
                quantity,
                color,
                product.effective_price(),
            )
            .await?;

        self.refresh_totals(owner).await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the shopper has no cart or the line
    /// isn't in it, and `ApiError::Conflict` when stock is insufficient.
    pub async fn update_item(
        &self,
        owner: ShopperIdentity,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<Cart, ApiError> {
        let cart = self
            .carts
            .get_for(owner)
            .await?
            .ok_or_else(|| ApiError::NotFound("cart".to_owned()))?;

        let item = cart
            .items
            .iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ApiError::NotFound(format!("cart item {item_id}")))?;

        let product = self
            .products
            .get_by_id(item.product_id)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| ApiError::NotFound(format!("product {}", item.product_id)))?;
        if !product.has_stock(quantity) {
            return Err(ApiError::Conflict(format!(
                "only {} units in stock",
                product.quantity
            )));
        }

        self.carts
            .update_item_quantity(cart.id, item_id, quantity)
            .await?;
        self.refresh_totals(owner).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the shopper has no cart or the line
    /// isn't in it.
    pub async fn remove_item(
        &self,
        owner: ShopperIdentity,
        item_id: CartItemId,
    ) -> Result<Cart, ApiError> {
        let cart = self
            .carts
            .get_for(owner)
            .await?
            .ok_or_else(|| ApiError::NotFound("cart".to_owned()))?;

        self.carts.remove_item(cart.id, item_id).await?;
        self.refresh_totals(owner).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Database` if a query fails.
    pub async fn clear(&self, owner: ShopperIdentity) -> Result<Cart, ApiError> {
        let cart = self.carts.get_or_create(owner).await?;
        self.carts.clear(cart.id).await?;
        Ok(self
            .carts
            .get_for(owner)
            .await?
            .unwrap_or(cart))
    }

    /// Apply a coupon code to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown codes and
    /// `ApiError::BadRequest` for expired ones.
    pub async fn apply_coupon(
        &self,
        owner: ShopperIdentity,
        code: &str,
    ) -> Result<Cart, ApiError> {
        let coupon = self
            .coupons
            .get_by_name(code)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("coupon '{code}'")))?;

        if !coupon.is_redeemable(chrono::Utc::now()) {
            return Err(ApiError::BadRequest("coupon has expired".to_owned()));
        }

        let cart = self.carts.get_or_create(owner).await?;
        self.carts.set_coupon(cart.id, Some(coupon.id)).await?;
        self.refresh_totals(owner).await
    }

    /// Merge the guest cart identified by `guest_token` into the user's cart.
    ///
    /// Runs after login: line quantities are summed, the guest cart is
    /// deleted, and the user's coupon (if any) is kept. A missing or empty
    /// guest cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Database` if a query fails.
    pub async fn merge_guest_cart(
        &self,
        user_id: UserId,
        guest_token: Uuid,
    ) -> Result<Cart, ApiError> {
        let user_owner = ShopperIdentity::User(user_id);
        let guest_cart = self.carts.get_for(ShopperIdentity::Guest(guest_token)).await?;

        let Some(guest_cart) = guest_cart else {
            return self.get_cart(user_owner).await;
        };

        let user_cart = self.carts.get_or_create(user_owner).await?;
        self.carts.merge(guest_cart.id, user_cart.id).await?;
        self.refresh_totals(user_owner).await
    }

    /// Recompute and persist cart totals, returning the fresh cart.
    async fn refresh_totals(&self, owner: ShopperIdentity) -> Result<Cart, ApiError> {
        let mut cart = self
            .carts
            .get_for(owner)
            .await?
            .ok_or_else(|| ApiError::NotFound("cart".to_owned()))?;

        let (total, total_after) =
            compute_totals(&cart.items, cart.coupon.as_ref(), cart.currency)?;
        self.carts.save_totals(cart.id, total, total_after).await?;

        cart.total_price = total;
        cart.total_after_discount = total_after;
        Ok(cart)
    }
}

/// Compute cart totals: the sum of line prices and, when a coupon is applied,
/// the discounted total rounded to cents.
///
/// # Errors
///
/// Returns `ApiError::Internal` on arithmetic overflow or an out-of-range
/// stored discount.
pub fn compute_totals(
    items: &[CartItem],
    coupon: Option<&AppliedCoupon>,
    currency: CurrencyCode,
) -> Result<(Decimal, Option<Decimal>), ApiError> {
    let mut total = Price::zero(currency);
    for item in items {
        let quantity = u32::try_from(item.quantity)
            .map_err(|_| ApiError::Internal("negative cart quantity".to_owned()))?;
        let line = Price::new(item.unit_price, currency)
            .checked_mul(quantity)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        total = total
            .checked_add(line)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
    }

    let total_after = coupon
        .map(|c| {
            total
                .apply_discount_percent(c.discount_percent)
                .map(|p| p.amount)
        })
        .transpose()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((total.amount, total_after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;
    use souq_core::{CartItemId, CouponId};

    fn item(id: i32, quantity: i32, unit_price: Decimal) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            title: format!("product {id}"),
            quantity,
            color: None,
            unit_price,
        }
    }

    #[test]
    fn test_compute_totals_empty() {
        let (total, after) = compute_totals(&[], None, CurrencyCode::EGP).expect("ok");
        assert_eq!(total, Decimal::ZERO);
        assert!(after.is_none());
    }

    #[test]
    fn test_compute_totals_sums_lines() {
        let items = vec![item(1, 2, dec!(150)), item(2, 3, dec!(20))];
        let (total, after) = compute_totals(&items, None, CurrencyCode::EGP).expect("ok");
        assert_eq!(total, dec!(360));
        assert!(after.is_none());
    }

    #[test]
    fn test_compute_totals_applies_coupon() {
        let items = vec![item(1, 1, dec!(200))];
        let coupon = AppliedCoupon {
            id: CouponId::new(1),
            name: "EID15".to_owned(),
            discount_percent: 15,
        };
        let (total, after) =
            compute_totals(&items, Some(&coupon), CurrencyCode::EGP).expect("ok");
        assert_eq!(total, dec!(200));
        assert_eq!(after, Some(dec!(170.00)));
    }

    #[test]
    fn test_compute_totals_rejects_negative_quantity() {
        let items = vec![item(1, -1, dec!(10))];
        assert!(compute_totals(&items, None, CurrencyCode::EGP).is_err());
    }
}
