//! HTTP route handlers for the API.
//!
//! # Route Structure (all JSON, prefixed `/api/v1`)
//!
//! ```text
//! # Auth
//! POST /auth/signup                  - Create account, returns {token, user}
//! POST /auth/login                   - Login, returns {token, user}
//! POST /auth/forgot-password         - Email a 6-digit reset code
//! POST /auth/verify-reset-code       - Verify the emailed code
//! PUT  /auth/reset-password          - Set a new password (verified code)
//! GET  /auth/me                      - Current user (auth)
//! PUT  /auth/me                      - Update profile (auth)
//! PUT  /auth/change-password         - Rotate password, returns fresh token (auth)
//! DELETE /auth/me                    - Deactivate account (auth)
//!
//! # Catalog (public reads, staff writes)
//! GET    /categories                 - Paginated listing
//! GET    /categories/{slug}          - Category detail
//! GET    /categories/{slug}/subcategories - Children of a category
//! POST   /categories                 - Create (staff)
//! PUT    /categories/{id}            - Update (staff)
//! DELETE /categories/{id}            - Soft delete (staff)
//! PUT    /categories/{id}/restore    - Restore (staff)
//! (same shape for /subcategories and /brands)
//!
//! GET    /products                   - Paginated listing with filters
//! GET    /products/{slug}            - Product detail (cached)
//! POST/PUT/DELETE/restore            - Staff product management
//!
//! # Media (staff)
//! POST   /media/images               - Multipart image upload
//! DELETE /media/images/{asset_id}    - Delete an asset
//!
//! # Cart (user or guest)
//! GET    /cart                       - Current cart
//! POST   /cart/items                 - Add item
//! PUT    /cart/items/{id}            - Set line quantity
//! DELETE /cart/items/{id}            - Remove line
//! DELETE /cart                       - Clear cart
//! PUT    /cart/apply-coupon          - Apply coupon code
//! POST   /cart/merge                 - Merge guest cart into user cart (auth)
//!
//! # Coupons (staff)
//! GET/POST /coupons, GET/PUT/DELETE /coupons/{id}, PUT /coupons/{id}/restore
//!
//! # Addresses (auth)
//! GET/POST /addresses, PUT/DELETE /addresses/{id}
//!
//! # Orders
//! POST /orders                       - Cash checkout from cart (user or guest)
//! GET  /orders                       - Own orders (staff: all)
//! GET  /orders/{id}                  - Order detail (owner or staff)
//! PUT  /orders/{id}/pay              - Mark paid (staff)
//! PUT  /orders/{id}/deliver          - Mark delivered (staff)
//! PUT  /orders/{id}/cancel           - Cancel and restock (staff)
//! ```

pub mod addresses;
pub mod auth;
pub mod brands;
pub mod cart;
pub mod categories;
pub mod coupons;
pub mod media;
pub mod orders;
pub mod products;
pub mod subcategories;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-reset-code", post(auth::verify_reset_code))
        .route("/reset-password", put(auth::reset_password))
        .route(
            "/me",
            get(auth::me).put(auth::update_me).delete(auth::deactivate),
        )
        .route("/change-password", put(auth::change_password))
}

/// Create the category routes router.
///
/// Reads address a category by slug; mutations take the numeric ID in the
/// same path position.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{slug}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::remove),
        )
        .route("/{slug}/subcategories", get(categories::subcategories))
        .route("/{slug}/restore", put(categories::restore))
}

/// Create the subcategory routes router.
pub fn subcategory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(subcategories::list).post(subcategories::create))
        .route(
            "/{id}",
            put(subcategories::update).delete(subcategories::remove),
        )
        .route("/{id}/restore", put(subcategories::restore))
}

/// Create the brand routes router.
pub fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(brands::list).post(brands::create))
        .route(
            "/{slug}",
            get(brands::show).put(brands::update).delete(brands::remove),
        )
        .route("/{slug}/restore", put(brands::restore))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{slug}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/{slug}/restore", put(products::restore))
}

/// Create the media routes router.
pub fn media_routes() -> Router<AppState> {
    Router::new()
        .route("/images", post(media::upload))
        .route("/images/{asset_id}", delete(media::remove))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/apply-coupon", put(cart::apply_coupon))
        .route("/merge", post(cart::merge))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::list).post(coupons::create))
        .route(
            "/{id}",
            get(coupons::show).put(coupons::update).delete(coupons::remove),
        )
        .route("/{id}/restore", put(coupons::restore))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::list).post(addresses::create))
        .route(
            "/{id}",
            put(addresses::update).delete(addresses::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/pay", put(orders::pay))
        .route("/{id}/deliver", put(orders::deliver))
        .route("/{id}/cancel", put(orders::cancel))
}

/// Create all routes for the API under the versioned prefix.
pub fn routes() -> Router<AppState> {
    let v1 = Router::new()
        // Auth gets the strict limiter; everything else the relaxed one.
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
        .merge(
            Router::new()
                .nest("/categories", category_routes())
                .nest("/subcategories", subcategory_routes())
                .nest("/brands", brand_routes())
                .nest("/products", product_routes())
                .nest("/media", media_routes())
                .nest("/cart", cart_routes())
                .nest("/coupons", coupon_routes())
                .nest("/addresses", address_routes())
                .nest("/orders", order_routes())
                .layer(api_rate_limiter()),
        );

    Router::new().nest("/api/v1", v1)
}
