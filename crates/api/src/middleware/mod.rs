//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Guest token (ensure anonymous shoppers carry an identity cookie)
//! 5. Security headers (nosniff, frame-deny, referrer policy)
//! 6. CORS (storefront and admin-dashboard origins)
//! 7. Rate limiting (governor: strict on auth, relaxed elsewhere)

pub mod auth;
pub mod guest;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{OptionalUser, RequireAdmin, RequireStaff, RequireUser};
pub use guest::{GUEST_COOKIE_NAME, GUEST_HEADER, GuestTokenHint, Shopper, guest_token_middleware};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
