//! Brand route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use souq_core::BrandId;

use crate::db::brands::BrandRepository;
use crate::error::{ApiError, Result};
use crate::middleware::{OptionalUser, RequireStaff};
use crate::models::Brand;
use crate::pagination::{ListParams, Paginated};
use crate::routes::categories::slug_from_name;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// List brands.
///
/// GET /api/v1/brands
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Brand>>> {
    let staff = user.is_some_and(|u| u.role.is_staff());
    let (data, total) = BrandRepository::new(state.pool())
        .list(&params, staff)
        .await?;
    Ok(Json(Paginated::new(data, &params, total)))
}

/// Brand detail by slug.
///
/// GET /api/v1/brands/{slug}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Brand>> {
    let brand = BrandRepository::new(state.pool())
        .get_by_slug(&slug, false)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("brand '{slug}'")))?;
    Ok(Json(brand))
}

/// Brand create payload.
#[derive(Debug, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    pub image: Option<String>,
}

/// Create a brand.
///
/// POST /api/v1/brands
#[instrument(skip(state, payload))]
pub async fn create(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(payload): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<Brand>)> {
    let mut errors = FieldErrors::new();
    errors.require_len("name", &payload.name, 2, 100);
    errors.finish()?;

    let name = payload.name.trim();
    let slug = slug_from_name("name", name)?;
    let brand = BrandRepository::new(state.pool())
        .create(name, &slug, payload.image.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

/// Brand update payload. `None` fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Update a brand. Renaming recomputes the slug.
///
/// PUT /api/v1/brands/{id}
#[instrument(skip(state, payload))]
pub async fn update(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
    Json(payload): Json<UpdateBrandRequest>,
) -> Result<Json<Brand>> {
    let mut errors = FieldErrors::new();
    errors.require_len_opt("name", payload.name.as_deref(), 2, 100);
    errors.finish()?;

    let name = payload.name.as_deref().map(str::trim);
    let slug = name.map(|n| slug_from_name("name", n)).transpose()?;

    let brand = BrandRepository::new(state.pool())
        .update(id, name, slug.as_ref(), payload.image.as_deref())
        .await?;
    Ok(Json(brand))
}

/// Soft-delete a brand.
///
/// DELETE /api/v1/brands/{id}
#[instrument(skip(state))]
pub async fn remove(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
) -> Result<StatusCode> {
    BrandRepository::new(state.pool()).soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted brand.
///
/// PUT /api/v1/brands/{id}/restore
#[instrument(skip(state))]
pub async fn restore(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
) -> Result<Json<Brand>> {
    let brand = BrandRepository::new(state.pool()).restore(id).await?;
    Ok(Json(brand))
}
