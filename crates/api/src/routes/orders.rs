//! Order route handlers.
//!
//! Checkout turns the caller's cart into an order. Users may ship to a saved
//! address-book entry or an inline address; guests always ship inline. Status
//! transitions (pay, deliver, cancel) are staff actions.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use souq_core::{AddressId, OrderId, PaymentMethod};

use crate::db::orders::OrderRepository;
use crate::error::{ApiError, Result};
use crate::middleware::{OptionalUser, RequireStaff, Shopper};
use crate::models::{Order, ShippingAddress, ShopperIdentity};
use crate::pagination::{ListParams, Paginated};
use crate::services::OrderService;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Checkout payload.
///
/// Exactly one of `address_id` (users only) or `shipping` must be given.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub address_id: Option<AddressId>,
    pub shipping: Option<ShippingAddress>,
}

/// Place an order from the caller's cart.
///
/// POST /api/v1/orders
#[instrument(skip(state, payload))]
pub async fn create(
    Shopper(owner): Shopper,
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let service = OrderService::new(state.pool(), &state.config().checkout);

    let order = match (payload.address_id, payload.shipping) {
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "give either address_id or shipping, not both".to_owned(),
            ));
        }
        (Some(address_id), None) => {
            let ShopperIdentity::User(user_id) = owner else {
                return Err(ApiError::BadRequest(
                    "guests must provide a shipping address".to_owned(),
                ));
            };
            service
                .checkout_to_saved_address(user_id, payload.payment_method, address_id)
                .await?
        }
        (None, Some(shipping)) => {
            let mut errors = FieldErrors::new();
            errors.require_len("shipping.details", &shipping.details, 5, 300);
            errors.require_len("shipping.phone", &shipping.phone, 6, 20);
            errors.require_len("shipping.city", &shipping.city, 2, 100);
            errors.finish()?;

            service
                .checkout(owner, payload.payment_method, shipping)
                .await?
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "a shipping address is required".to_owned(),
            ));
        }
    };

    tracing::info!(order_id = %order.id, total = %order.total_price, "Order placed");
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders: the caller's own, or all of them for staff.
///
/// GET /api/v1/orders
#[instrument(skip(state, user))]
pub async fn list(
    OptionalUser(user): OptionalUser,
    Shopper(owner): Shopper,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Order>>> {
    let scope = if user.is_some_and(|u| u.role.is_staff()) {
        None
    } else {
        Some(owner)
    };

    let (data, total) = OrderRepository::new(state.pool())
        .list(&params, scope)
        .await?;
    Ok(Json(Paginated::new(data, &params, total)))
}

/// Order detail, visible to its owner and to staff.
///
/// GET /api/v1/orders/{id}
#[instrument(skip(state, user))]
pub async fn show(
    OptionalUser(user): OptionalUser,
    Shopper(owner): Shopper,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let caller = if user.is_some_and(|u| u.role.is_staff()) {
        None
    } else {
        Some(owner)
    };

    let order = OrderService::new(state.pool(), &state.config().checkout)
        .get_for_caller(id, caller)
        .await?;
    Ok(Json(order))
}

/// Mark an order as paid.
///
/// PUT /api/v1/orders/{id}/pay
#[instrument(skip(state))]
pub async fn pay(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool()).mark_paid(id).await?;
    tracing::info!(order_id = %id, "Order marked paid");
    Ok(Json(order))
}

/// Mark an order as delivered.
///
/// PUT /api/v1/orders/{id}/deliver
#[instrument(skip(state))]
pub async fn deliver(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool()).mark_delivered(id).await?;
    tracing::info!(order_id = %id, "Order marked delivered");
    Ok(Json(order))
}

/// Cancel an order and restock its items.
///
/// PUT /api/v1/orders/{id}/cancel
#[instrument(skip(state))]
pub async fn cancel(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool()).cancel(id).await?;
    tracing::info!(order_id = %id, "Order cancelled");
    Ok(Json(order))
}
