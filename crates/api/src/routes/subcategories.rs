//! Subcategory route handlers.
//!
//! Subcategories hang off a parent category; their slugs are unique per
//! category, not globally, so reads go through the nested category route
//! (`/categories/{slug}/subcategories`) while this flat router carries the
//! listing and the staff mutations.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use souq_core::{CategoryId, SubCategoryId};

use crate::db::subcategories::SubCategoryRepository;
use crate::error::Result;
use crate::middleware::{OptionalUser, RequireStaff};
use crate::models::SubCategory;
use crate::pagination::{ListParams, Paginated};
use crate::routes::categories::slug_from_name;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// List subcategories across all categories.
///
/// GET /api/v1/subcategories
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<SubCategory>>> {
    let staff = user.is_some_and(|u| u.role.is_staff());
    let (data, total) = SubCategoryRepository::new(state.pool())
        .list(&params, None, staff)
        .await?;
    Ok(Json(Paginated::new(data, &params, total)))
}

/// Subcategory create payload.
#[derive(Debug, Deserialize)]
pub struct CreateSubCategoryRequest {
    pub name: String,
    pub category_id: CategoryId,
}

/// Create a subcategory under a category.
///
/// POST /api/v1/subcategories
#[instrument(skip(state, payload))]
pub async fn create(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(payload): Json<CreateSubCategoryRequest>,
) -> Result<(StatusCode, Json<SubCategory>)> {
    let mut errors = FieldErrors::new();
    errors.require_len("name", &payload.name, 2, 100);
    errors.finish()?;

    let name = payload.name.trim();
    let slug = slug_from_name("name", name)?;
    let subcategory = SubCategoryRepository::new(state.pool())
        .create(payload.category_id, name, &slug)
        .await?;
    Ok((StatusCode::CREATED, Json(subcategory)))
}

/// Subcategory update payload. `None` fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateSubCategoryRequest {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// Update a subcategory. Renaming recomputes the slug.
///
/// PUT /api/v1/subcategories/{id}
#[instrument(skip(state, payload))]
pub async fn update(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<SubCategoryId>,
    Json(payload): Json<UpdateSubCategoryRequest>,
) -> Result<Json<SubCategory>> {
    let mut errors = FieldErrors::new();
    errors.require_len_opt("name", payload.name.as_deref(), 2, 100);
    errors.finish()?;

    let name = payload.name.as_deref().map(str::trim);
    let slug = name.map(|n| slug_from_name("name", n)).transpose()?;

    let subcategory = SubCategoryRepository::new(state.pool())
        .update(id, name, slug.as_ref(), payload.category_id)
        .await?;
    Ok(Json(subcategory))
}

/// Soft-delete a subcategory.
///
/// DELETE /api/v1/subcategories/{id}
#[instrument(skip(state))]
pub async fn remove(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<SubCategoryId>,
) -> Result<StatusCode> {
    SubCategoryRepository::new(state.pool()).soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted subcategory.
///
/// PUT /api/v1/subcategories/{id}/restore
#[instrument(skip(state))]
pub async fn restore(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<SubCategoryId>,
) -> Result<Json<SubCategory>> {
    let subcategory = SubCategoryRepository::new(state.pool()).restore(id).await?;
    Ok(Json(subcategory))
}
