//! Product route handlers.
//!
//! The public listing carries the full catalog filter set (category,
//! subcategory, brand, price band, rating floor) on top of the shared list
//! parameters. Detail reads are served through the moka cache in
//! [`AppState`]; every mutation invalidates the affected slug(s).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use souq_core::{BrandId, CategoryId, ProductId, SubCategoryId};

use crate::db::products::{NewProduct, ProductFilters, ProductRepository, ProductUpdate};
use crate::error::{ApiError, Result};
use crate::middleware::{OptionalUser, RequireStaff};
use crate::models::Product;
use crate::pagination::{ListParams, Paginated};
use crate::routes::categories::slug_from_name;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Catalog filters deserialized from the query string alongside [`ListParams`].
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilterParams {
    /// Category slug.
    pub category: Option<String>,
    /// Subcategory slug.
    pub subcategory: Option<String>,
    /// Brand slug.
    pub brand: Option<String>,
    /// Minimum effective price.
    pub min_price: Option<Decimal>,
    /// Maximum effective price.
    pub max_price: Option<Decimal>,
    /// Minimum average rating.
    pub min_rating: Option<Decimal>,
}

impl From<ProductFilterParams> for ProductFilters {
    fn from(p: ProductFilterParams) -> Self {
        Self {
            category: p.category,
            subcategory: p.subcategory,
            brand: p.brand,
            min_price: p.min_price,
            max_price: p.max_price,
            min_rating: p.min_rating,
        }
    }
}

/// List products with catalog filters.
///
/// GET /api/v1/products
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(params): Query<ListParams>,
    Query(filters): Query<ProductFilterParams>,
) -> Result<Json<Paginated<Product>>> {
    let staff = user.is_some_and(|u| u.role.is_staff());
    let (data, total) = ProductRepository::new(state.pool())
        .list(&params, &filters.into(), staff)
        .await?;
    Ok(Json(Paginated::new(data, &params, total)))
}

/// Product detail by slug, served through the detail cache.
///
/// GET /api/v1/products/{slug}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    if let Some(cached) = state.product_cache().get(&slug).await {
        return Ok(Json(Product::clone(&cached)));
    }

    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug, false)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product '{slug}'")))?;

    state
        .product_cache()
        .insert(slug, Arc::new(product.clone()))
        .await;
    Ok(Json(product))
}

/// Product create payload.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub quantity: i32,
    pub price: Decimal,
    pub price_after_discount: Option<Decimal>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub image_cover: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: CategoryId,
    pub brand_id: Option<BrandId>,
    #[serde(default)]
    pub subcategory_ids: Vec<SubCategoryId>,
}

fn check_pricing(errors: &mut FieldErrors, price: Decimal, discounted: Option<Decimal>) {
    if price <= Decimal::ZERO {
        errors.push("price", "must be greater than zero");
    }
    if let Some(discounted) = discounted {
        if discounted <= Decimal::ZERO {
            errors.push("price_after_discount", "must be greater than zero");
        } else if discounted >= price {
            errors.push("price_after_discount", "must be below the list price");
        }
    }
}

/// Create a product.
///
/// POST /api/v1/products
#[instrument(skip(state, payload))]
pub async fn create(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let mut errors = FieldErrors::new();
    errors.require_len("title", &payload.title, 3, 200);
    errors.require_len("description", &payload.description, 10, 2000);
    if payload.quantity < 0 {
        errors.push("quantity", "must not be negative");
    }
    check_pricing(&mut errors, payload.price, payload.price_after_discount);
    errors.finish()?;

    let title = payload.title.trim();
    let slug = slug_from_name("title", title)?;
    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            title,
            slug: &slug,
            description: payload.description.trim(),
            quantity: payload.quantity,
            price: payload.price,
            price_after_discount: payload.price_after_discount,
            colors: &payload.colors,
            image_cover: payload.image_cover.as_deref(),
            images: &payload.images,
            category_id: payload.category_id,
            brand_id: payload.brand_id,
            subcategory_ids: &payload.subcategory_ids,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Deserialize a present field (including an explicit `null`) as `Some`.
///
/// Combined with `#[serde(default)]`, this lets an update payload
/// distinguish an absent field (leave alone) from `null` (clear).
fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Product update payload. `None` fields are left unchanged; the
/// double-`Option` fields distinguish "leave alone" from "clear".
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub price_after_discount: Option<Option<Decimal>>,
    pub colors: Option<Vec<String>>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub brand_id: Option<Option<BrandId>>,
    pub subcategory_ids: Option<Vec<SubCategoryId>>,
}

/// Update a product. Retitling recomputes the slug.
///
/// PUT /api/v1/products/{id}
#[instrument(skip(state, payload))]
pub async fn update(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

    let mut errors = FieldErrors::new();
    errors.require_len_opt("title", payload.title.as_deref(), 3, 200);
    errors.require_len_opt("description", payload.description.as_deref(), 10, 2000);
    if payload.quantity.is_some_and(|q| q < 0) {
        errors.push("quantity", "must not be negative");
    }
    let price = payload.price.unwrap_or(existing.price);
    let discounted = payload
        .price_after_discount
        .unwrap_or(existing.price_after_discount);
    check_pricing(&mut errors, price, discounted);
    errors.finish()?;

    let title = payload.title.as_deref().map(str::trim);
    let slug = title.map(|t| slug_from_name("title", t)).transpose()?;

    let product = repo
        .update(
            id,
            &ProductUpdate {
                title,
                slug: slug.as_ref(),
                description: payload.description.as_deref().map(str::trim),
                quantity: payload.quantity,
                price: payload.price,
                price_after_discount: payload.price_after_discount,
                colors: payload.colors.as_deref(),
                image_cover: payload.image_cover.as_deref(),
                images: payload.images.as_deref(),
                category_id: payload.category_id,
                brand_id: payload.brand_id,
                subcategory_ids: payload.subcategory_ids.as_deref(),
            },
        )
        .await?;

    // The slug may have changed; drop both cache entries.
    state.invalidate_product(existing.slug.as_str()).await;
    state.invalidate_product(product.slug.as_str()).await;
    Ok(Json(product))
}

/// Soft-delete a product.
///
/// DELETE /api/v1/products/{id}
#[instrument(skip(state))]
pub async fn remove(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

    repo.soft_delete(id).await?;
    state.invalidate_product(existing.slug.as_str()).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted product.
///
/// PUT /api/v1/products/{id}/restore
#[instrument(skip(state))]
pub async fn restore(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool()).restore(id).await?;
    state.invalidate_product(product.slug.as_str()).await;
    Ok(Json(product))
}
