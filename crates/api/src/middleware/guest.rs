//! Guest identity middleware and shopper extractor.
//!
//! Anonymous shoppers are identified by a UUID carried in the `souq_guest`
//! cookie or the `x-guest-token` header (for SPA clients that manage the
//! token themselves). The middleware mints a token for first-time visitors
//! and makes it available to the same request via extensions, so a brand-new
//! guest can add to their cart on their very first call.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::OptionalUser;
use crate::models::ShopperIdentity;
use crate::state::AppState;

/// Cookie holding the guest token.
pub const GUEST_COOKIE_NAME: &str = "souq_guest";

/// Header that overrides the cookie.
pub const GUEST_HEADER: &str = "x-guest-token";

/// Request extension carrying the resolved guest token.
#[derive(Debug, Clone, Copy)]
struct GuestToken(Uuid);

/// Resolve the guest token from header, then cookie.
fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<Uuid> {
    if let Some(token) = headers
        .get(GUEST_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uuid>().ok())
    {
        return Some(token);
    }
    CookieJar::from_headers(headers)
        .get(GUEST_COOKIE_NAME)
        .and_then(|c| c.value().parse::<Uuid>().ok())
}

/// Middleware that guarantees every request carries a guest token.
///
/// Existing tokens (header or cookie) are passed through; first-time
/// visitors get a fresh UUID, set as a persistent cookie on the response and
/// injected into the request so downstream extractors see it immediately.
pub async fn guest_token_middleware(
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> (CookieJar, Response) {
    let (token, jar) = match token_from_headers(request.headers()) {
        Some(token) => (token, jar),
        None => {
            let token = Uuid::new_v4();
            let cookie = Cookie::build((GUEST_COOKIE_NAME, token.to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .permanent()
                .build();
            (token, jar.add(cookie))
        }
    };

    request.extensions_mut().insert(GuestToken(token));
    (jar, next.run(request).await)
}

/// Extractor resolving the calling shopper: an authenticated user when a
/// valid bearer token is present, otherwise the guest token.
///
/// # Example
///
/// ```rust,ignore
/// async fn show_cart(Shopper(owner): Shopper, State(state): State<AppState>) { ... }
/// ```
pub struct Shopper(pub ShopperIdentity);

impl FromRequestParts<AppState> for Shopper {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A presented bearer token must be valid; a bad token is an error,
        // not a silent fall-through to guest identity.
        if parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            let OptionalUser(user) = OptionalUser::from_request_parts(parts, state)
                .await
                .unwrap_or(OptionalUser(None));
            return user.map_or_else(
                || {
                    Err(ApiError::Unauthorized(
                        "invalid bearer token".to_owned(),
                    ))
                },
                |user| Ok(Self(ShopperIdentity::User(user.id))),
            );
        }

        let token = parts
            .extensions
            .get::<GuestToken>()
            .map(|t| t.0)
            .or_else(|| token_from_headers(&parts.headers))
            .ok_or_else(|| ApiError::Unauthorized("missing guest token".to_owned()))?;

        Ok(Self(ShopperIdentity::Guest(token)))
    }
}

/// Extract the raw guest token (cookie/header) even for authenticated
/// callers. Used by the cart-merge endpoint after login.
pub struct GuestTokenHint(pub Option<Uuid>);

impl<S> FromRequestParts<S> for GuestTokenHint
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .extensions
            .get::<GuestToken>()
            .map(|t| t.0)
            .or_else(|| token_from_headers(&parts.headers));
        Ok(Self(token))
    }
}
