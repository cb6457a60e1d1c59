//! Domain models for the Souq API.
//!
//! These types represent validated domain objects separate from database row
//! types. Repositories map rows into them; routes serialize them (or thin
//! views of them) into JSON responses.

pub mod address;
pub mod brand;
pub mod cart;
pub mod category;
pub mod coupon;
pub mod order;
pub mod product;
pub mod subcategory;
pub mod user;

pub use address::Address;
pub use brand::Brand;
pub use cart::{AppliedCoupon, Cart, CartItem};
pub use category::Category;
pub use coupon::Coupon;
pub use order::{Order, OrderItem, ShippingAddress};
pub use product::Product;
pub use subcategory::SubCategory;
pub use user::User;

use serde::Serialize;
use souq_core::UserId;
use uuid::Uuid;

/// Identity of the shopper a cart or order belongs to.
///
/// Carts and orders belong to an authenticated user or to an anonymous guest
/// token, never both. Constructing the identity through this enum keeps the
/// exclusivity invariant out of reach of handler code; the database enforces
/// the same rule with a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ShopperIdentity {
    /// An authenticated user.
    User(UserId),
    /// An anonymous guest identified by cookie/header token.
    Guest(Uuid),
}

impl ShopperIdentity {
    /// The user ID column value for this identity.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// The guest token column value for this identity.
    #[must_use]
    pub const fn guest_token(&self) -> Option<Uuid> {
        match self {
            Self::User(_) => None,
            Self::Guest(token) => Some(*token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopper_identity_is_exclusive() {
        let user = ShopperIdentity::User(UserId::new(1));
        assert!(user.user_id().is_some());
        assert!(user.guest_token().is_none());

        let guest = ShopperIdentity::Guest(Uuid::nil());
        assert!(guest.user_id().is_none());
        assert!(guest.guest_token().is_some());
    }
}
