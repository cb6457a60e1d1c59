//! Address-book route handlers (authenticated users only).
//!
//! Address books are small, so the listing is a plain array rather than a
//! paginated envelope. Aliases ("home", "work") are unique per user.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use souq_core::AddressId;

use crate::db::addresses::AddressRepository;
use crate::error::{ApiError, Result};
use crate::middleware::RequireUser;
use crate::models::Address;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// List the caller's addresses.
///
/// GET /api/v1/addresses
#[instrument(skip(state, user))]
pub async fn list(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_by_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// Address create payload.
#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub alias: String,
    pub details: String,
    pub phone: String,
    pub city: String,
    pub postal_code: Option<String>,
}

/// Add an address to the caller's book.
///
/// POST /api/v1/addresses
#[instrument(skip(state, user, payload))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Address>)> {
    let mut errors = FieldErrors::new();
    errors.require_len("alias", &payload.alias, 2, 50);
    errors.require_len("details", &payload.details, 5, 300);
    errors.require_len("phone", &payload.phone, 6, 20);
    errors.require_len("city", &payload.city, 2, 100);
    errors.require_len_opt("postal_code", payload.postal_code.as_deref(), 3, 20);
    errors.finish()?;

    let address = AddressRepository::new(state.pool())
        .create(
            user.id,
            payload.alias.trim(),
            payload.details.trim(),
            payload.phone.trim(),
            payload.city.trim(),
            payload.postal_code.as_deref().map(str::trim),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Address update payload. `None` fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    pub alias: Option<String>,
    pub details: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Update one of the caller's addresses.
///
/// PUT /api/v1/addresses/{id}
#[instrument(skip(state, user, payload))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
    Json(payload): Json<UpdateAddressRequest>,
) -> Result<Json<Address>> {
    let mut errors = FieldErrors::new();
    errors.require_len_opt("alias", payload.alias.as_deref(), 2, 50);
    errors.require_len_opt("details", payload.details.as_deref(), 5, 300);
    errors.require_len_opt("phone", payload.phone.as_deref(), 6, 20);
    errors.require_len_opt("city", payload.city.as_deref(), 2, 100);
    errors.require_len_opt("postal_code", payload.postal_code.as_deref(), 3, 20);
    errors.finish()?;

    let address = AddressRepository::new(state.pool())
        .update(
            user.id,
            id,
            payload.alias.as_deref().map(str::trim),
            payload.details.as_deref().map(str::trim),
            payload.phone.as_deref().map(str::trim),
            payload.city.as_deref().map(str::trim),
            payload.postal_code.as_deref().map(str::trim),
        )
        .await?;
    Ok(Json(address))
}

/// Remove one of the caller's addresses.
///
/// DELETE /api/v1/addresses/{id}
#[instrument(skip(state, user))]
pub async fn remove(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    let deleted = AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("address {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
