//! Cart route handlers.
//!
//! Every endpoint resolves the caller through the [`Shopper`] extractor, so
//! the same routes serve authenticated users and anonymous guests. The merge
//! endpoint is the one exception: it requires a user, and absorbs the guest
//! cart named by the accompanying token after login.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use souq_core::{CartItemId, ProductId};

use crate::error::Result;
use crate::middleware::{GuestTokenHint, RequireUser, Shopper};
use crate::models::Cart;
use crate::services::CartService;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Current cart, created empty on first touch.
///
/// GET /api/v1/cart
#[instrument(skip(state))]
pub async fn show(
    Shopper(owner): Shopper,
    State(state): State<AppState>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool()).get_cart(owner).await?;
    Ok(Json(cart))
}

/// Add-item payload.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub color: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// Add units of a product to the cart.
///
/// POST /api/v1/cart/items
#[instrument(skip(state, payload))]
pub async fn add_item(
    Shopper(owner): Shopper,
    State(state): State<AppState>,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    let mut errors = FieldErrors::new();
    errors.require_positive("quantity", payload.quantity);
    errors.finish()?;

    let cart = CartService::new(state.pool())
        .add_item(
            owner,
            payload.product_id,
            payload.quantity,
            payload.color.as_deref(),
        )
        .await?;
    Ok(Json(cart))
}

/// Set-quantity payload.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Set the quantity of a cart line.
///
/// PUT /api/v1/cart/items/{id}
#[instrument(skip(state, payload))]
pub async fn update_item(
    Shopper(owner): Shopper,
    State(state): State<AppState>,
    Path(id): Path<CartItemId>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<Cart>> {
    let mut errors = FieldErrors::new();
    errors.require_positive("quantity", payload.quantity);
    errors.finish()?;

    let cart = CartService::new(state.pool())
        .update_item(owner, id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line from the cart.
///
/// DELETE /api/v1/cart/items/{id}
#[instrument(skip(state))]
pub async fn remove_item(
    Shopper(owner): Shopper,
    State(state): State<AppState>,
    Path(id): Path<CartItemId>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool()).remove_item(owner, id).await?;
    Ok(Json(cart))
}

/// Empty the cart.
///
/// DELETE /api/v1/cart
#[instrument(skip(state))]
pub async fn clear(
    Shopper(owner): Shopper,
    State(state): State<AppState>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool()).clear(owner).await?;
    Ok(Json(cart))
}

/// Apply-coupon payload.
#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

/// Apply a coupon code to the cart.
///
/// PUT /api/v1/cart/apply-coupon
#[instrument(skip(state, payload))]
pub async fn apply_coupon(
    Shopper(owner): Shopper,
    State(state): State<AppState>,
    Json(payload): Json<ApplyCouponRequest>,
) -> Result<Json<Cart>> {
    let mut errors = FieldErrors::new();
    errors.require_len("code", &payload.code, 2, 50);
    errors.finish()?;

    let cart = CartService::new(state.pool())
        .apply_coupon(owner, payload.code.trim())
        .await?;
    Ok(Json(cart))
}

/// Merge the guest cart into the authenticated user's cart.
///
/// POST /api/v1/cart/merge
///
/// Called by the client right after login, while the guest token is still in
/// the cookie/header. Without a guest token the user's cart is returned
/// unchanged.
#[instrument(skip(state, user))]
pub async fn merge(
    RequireUser(user): RequireUser,
    GuestTokenHint(guest_token): GuestTokenHint,
    State(state): State<AppState>,
) -> Result<Json<Cart>> {
    let service = CartService::new(state.pool());
    let cart = match guest_token {
        Some(token) => {
            let merged = service.merge_guest_cart(user.id, token).await?;
            tracing::info!(user_id = %user.id, "Guest cart merged");
            merged
        }
        None => service.get_cart(crate::models::ShopperIdentity::User(user.id)).await?,
    };
    Ok(Json(cart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_add_item_defaults_quantity() {
        let payload: AddItemRequest =
            serde_json::from_str(r#"{"product_id": 7}"#).expect("valid payload");
        assert_eq!(payload.quantity, 1);
        assert!(payload.color.is_none());
    }

    #[test]
    fn test_add_item_rejects_zero_quantity() {
        let mut errors = FieldErrors::new();
        errors.require_positive("quantity", 0);
        assert!(matches!(errors.finish(), Err(ApiError::Validation(_))));
    }
}
