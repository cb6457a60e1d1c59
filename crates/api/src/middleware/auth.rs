//! Authentication extractors.
//!
//! Handlers opt into auth by taking one of these extractors:
//!
//! - [`RequireUser`] - any authenticated, active user
//! - [`RequireStaff`] - admin or manager
//! - [`RequireAdmin`] - admin only
//! - [`OptionalUser`] - user if a valid bearer token is present
//!
//! Tokens are stateless JWTs; every request reloads the user so deactivation
//! and password changes invalidate outstanding tokens immediately.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{ApiError, set_sentry_user};
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Extract the bearer token from the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let token = bearer_token(parts)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_owned()))?;

    let auth = AuthService::new(state.pool(), &state.config().jwt);
    let user = auth.authenticate(token).await?;

    // Associate subsequent errors on this request with the user.
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(user)
}

/// Extractor that requires an authenticated, active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireUser(user): RequireUser) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        Ok(Self(user))
    }
}

/// Extractor that requires a staff user (admin or manager).
pub struct RequireStaff(pub User);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.role.is_staff() {
            return Err(ApiError::Forbidden(
                "staff access required".to_owned(),
            ));
        }
        Ok(Self(user))
    }
}

/// Extractor that requires an admin user.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if user.role != souq_core::UserRole::Admin {
            return Err(ApiError::Forbidden("admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike [`RequireUser`], this does not reject the request when no valid
/// bearer token is present.
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(parts) {
            Some(_) => authenticate(parts, state).await.ok(),
            None => None,
        };
        Ok(Self(user))
    }
}
