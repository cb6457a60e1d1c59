//! Coupon route handlers (staff only).
//!
//! Shoppers never touch these routes; they redeem coupons through
//! `PUT /cart/apply-coupon`. Codes are normalized to uppercase on write.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use souq_core::CouponId;

use crate::db::coupons::CouponRepository;
use crate::error::{ApiError, Result};
use crate::middleware::RequireStaff;
use crate::models::Coupon;
use crate::pagination::{ListParams, Paginated};
use crate::state::AppState;
use crate::validation::FieldErrors;

/// List coupons.
///
/// GET /api/v1/coupons
#[instrument(skip(state))]
pub async fn list(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Coupon>>> {
    let (data, total) = CouponRepository::new(state.pool()).list(&params).await?;
    Ok(Json(Paginated::new(data, &params, total)))
}

/// Coupon detail.
///
/// GET /api/v1/coupons/{id}
#[instrument(skip(state))]
pub async fn show(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<Json<Coupon>> {
    let coupon = CouponRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("coupon {id}")))?;
    Ok(Json(coupon))
}

/// Coupon create payload.
#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    pub name: String,
    pub discount_percent: i32,
    pub expires_at: DateTime<Utc>,
}

/// Create a coupon.
///
/// POST /api/v1/coupons
#[instrument(skip(state, payload))]
pub async fn create(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(payload): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>)> {
    let mut errors = FieldErrors::new();
    errors.require_len("name", &payload.name, 2, 50);
    errors.require_range("discount_percent", payload.discount_percent, 1, 100);
    if payload.expires_at <= Utc::now() {
        errors.push("expires_at", "must be in the future");
    }
    errors.finish()?;

    let coupon = CouponRepository::new(state.pool())
        .create(&payload.name, payload.discount_percent, payload.expires_at)
        .await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Coupon update payload. `None` fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateCouponRequest {
    pub name: Option<String>,
    pub discount_percent: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Update a coupon.
///
/// PUT /api/v1/coupons/{id}
#[instrument(skip(state, payload))]
pub async fn update(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
    Json(payload): Json<UpdateCouponRequest>,
) -> Result<Json<Coupon>> {
    let mut errors = FieldErrors::new();
    errors.require_len_opt("name", payload.name.as_deref(), 2, 50);
    if let Some(percent) = payload.discount_percent {
        errors.require_range("discount_percent", percent, 1, 100);
    }
    errors.finish()?;

    let coupon = CouponRepository::new(state.pool())
        .update(
            id,
            payload.name.as_deref(),
            payload.discount_percent,
            payload.expires_at,
        )
        .await?;
    Ok(Json(coupon))
}

/// Soft-delete a coupon.
///
/// DELETE /api/v1/coupons/{id}
#[instrument(skip(state))]
pub async fn remove(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<StatusCode> {
    CouponRepository::new(state.pool()).soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted coupon.
///
/// PUT /api/v1/coupons/{id}/restore
#[instrument(skip(state))]
pub async fn restore(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<Json<Coupon>> {
    let coupon = CouponRepository::new(state.pool()).restore(id).await?;
    Ok(Json(coupon))
}
