//! Category route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use souq_core::{CategoryId, Slug};

use crate::db::categories::CategoryRepository;
use crate::db::subcategories::SubCategoryRepository;
use crate::error::{ApiError, Result};
use crate::middleware::{OptionalUser, RequireStaff};
use crate::models::{Category, SubCategory};
use crate::pagination::{ListParams, Paginated};
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Build a slug from a name, reporting failures as a field error.
pub(crate) fn slug_from_name(field: &str, name: &str) -> Result<Slug> {
    Slug::new(name).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.push(field, e.to_string());
        // finish() on a non-empty accumulator always errs
        errors.finish().expect_err("accumulator is non-empty")
    })
}

/// List categories.
///
/// GET /api/v1/categories
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Category>>> {
    let staff = user.is_some_and(|u| u.role.is_staff());
    let (data, total) = CategoryRepository::new(state.pool())
        .list(&params, staff)
        .await?;
    Ok(Json(Paginated::new(data, &params, total)))
}

/// Category detail by slug.
///
/// GET /api/v1/categories/{slug}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug, false)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category '{slug}'")))?;
    Ok(Json(category))
}

/// Subcategories of a category.
///
/// GET /api/v1/categories/{slug}/subcategories
#[instrument(skip(state))]
pub async fn subcategories(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<SubCategory>>> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug, false)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category '{slug}'")))?;

    let (data, total) = SubCategoryRepository::new(state.pool())
        .list(&params, Some(category.id), false)
        .await?;
    Ok(Json(Paginated::new(data, &params, total)))
}

/// Category create payload.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub image: Option<String>,
}

/// Create a category.
///
/// POST /api/v1/categories
#[instrument(skip(state, payload))]
pub async fn create(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let mut errors = FieldErrors::new();
    errors.require_len("name", &payload.name, 2, 100);
    errors.finish()?;

    let name = payload.name.trim();
    let slug = slug_from_name("name", name)?;
    let category = CategoryRepository::new(state.pool())
        .create(name, &slug, payload.image.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Category update payload. `None` fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Update a category. Renaming recomputes the slug.
///
/// PUT /api/v1/categories/{id}
#[instrument(skip(state, payload))]
pub async fn update(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    let mut errors = FieldErrors::new();
    errors.require_len_opt("name", payload.name.as_deref(), 2, 100);
    errors.finish()?;

    let name = payload.name.as_deref().map(str::trim);
    let slug = name.map(|n| slug_from_name("name", n)).transpose()?;

    let category = CategoryRepository::new(state.pool())
        .update(id, name, slug.as_ref(), payload.image.as_deref())
        .await?;
    Ok(Json(category))
}

/// Soft-delete a category.
///
/// DELETE /api/v1/categories/{id}
#[instrument(skip(state))]
pub async fn remove(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted category.
///
/// PUT /api/v1/categories/{id}/restore
#[instrument(skip(state))]
pub async fn restore(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool()).restore(id).await?;
    Ok(Json(category))
}
