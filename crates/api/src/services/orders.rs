//! Order service.
//!
//! Turns a cart into an order: validates the cart is non-empty, resolves the
//! shipping address (address book for users, inline for guests), prices the
//! order (items + tax + flat shipping), and delegates the transactional
//! write to the order repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use souq_core::{AddressId, OrderId, PaymentMethod, Price, UserId};

use crate::config::CheckoutConfig;
use crate::db::addresses::AddressRepository;
use crate::db::carts::CartRepository;
use crate::db::orders::{NewOrderPricing, OrderRepository};
use crate::error::ApiError;
use crate::models::{Order, ShippingAddress, ShopperIdentity};

/// Order service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    carts: CartRepository<'a>,
    addresses: AddressRepository<'a>,
    checkout: &'a CheckoutConfig,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, checkout: &'a CheckoutConfig) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            carts: CartRepository::new(pool),
            addresses: AddressRepository::new(pool),
            checkout,
        }
    }

    /// Place a cash order from the shopper's cart with an inline shipping
    /// address (guests, or users typing a one-off address).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::BadRequest` for an empty cart and
    /// `ApiError::Conflict` when stock ran out since the cart was built.
    pub async fn checkout(
        &self,
        owner: ShopperIdentity,
        payment_method: PaymentMethod,
        shipping: ShippingAddress,
    ) -> Result<Order, ApiError> {
        let cart = self
            .carts
            .get_for(owner)
            .await?
            .ok_or_else(|| ApiError::BadRequest("cart is empty".to_owned()))?;

        if cart.items.is_empty() {
            return Err(ApiError::BadRequest("cart is empty".to_owned()));
        }

        let pricing = self.price(&cart)?;
        let order = self
            .orders
            .create_from_cart(&cart, payment_method, &shipping, &pricing)
            .await?;
        Ok(order)
    }

    /// Place a cash order shipping to a saved address-book entry.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the address isn't in the user's book,
    /// plus everything [`Self::checkout`] can return.
    pub async fn checkout_to_saved_address(
        &self,
        user_id: UserId,
        payment_method: PaymentMethod,
        address_id: AddressId,
    ) -> Result<Order, ApiError> {
        let address = self
            .addresses
            .get(user_id, address_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("address {address_id}")))?;

        let shipping = ShippingAddress {
            details: address.details,
            phone: address.phone,
            city: address.city,
            postal_code: address.postal_code,
        };
        self.checkout(ShopperIdentity::User(user_id), payment_method, shipping)
            .await
    }

    /// Price a cart into an order summary.
    fn price(&self, cart: &crate::models::Cart) -> Result<NewOrderPricing, ApiError> {
        let items_price = cart.payable_total();

        let tax_price = if self.checkout.tax_percent == 0 {
            Decimal::ZERO
        } else {
            let items = Price::new(items_price, cart.currency);
            let percent = i32::try_from(self.checkout.tax_percent)
                .map_err(|_| ApiError::Internal("tax percent out of range".to_owned()))?;
            // Discount by (100 - tax)% and subtract to get the tax amount.
            let kept = items
                .apply_discount_percent(percent)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            items_price - kept.amount
        };

        let shipping_price = self.checkout.shipping_price;
        let total_price = items_price + tax_price + shipping_price;

        Ok(NewOrderPricing {
            items_price,
            tax_price,
            shipping_price,
            total_price,
            currency: cart.currency,
        })
    }

    /// Get an order, enforcing that non-staff callers only see their own.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown orders and for orders the
    /// caller doesn't own (existence is not leaked).
    pub async fn get_for_caller(
        &self,
        id: OrderId,
        caller: Option<ShopperIdentity>,
    ) -> Result<Order, ApiError> {
        let order = self
            .orders
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("order {id}")))?;

        match caller {
            // Staff see everything.
            None => Ok(order),
            Some(identity) if order.owner == identity => Ok(order),
            Some(_) => Err(ApiError::NotFound(format!("order {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    // Pricing math is exercised through CheckoutConfig-driven cases; the
    // repository interactions are covered by the integration suite.
    #[test]
    fn test_tax_amount_from_percent() {
        // 14% of 200.00 = 28.00; computed via the discount complement.
        let items = Price::new(dec!(200), souq_core::CurrencyCode::EGP);
        let kept = items.apply_discount_percent(14).expect("valid");
        assert_eq!(dec!(200) - kept.amount, dec!(28.00));
    }
}
