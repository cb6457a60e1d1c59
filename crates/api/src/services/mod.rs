//! Business services for the Souq API.
//!
//! Services sit between route handlers and repositories: they own the domain
//! rules (stock checks, coupon redeemability, token lifecycles, checkout
//! pricing) and the clients for external systems (media storage, SMTP).

pub mod auth;
pub mod cart;
pub mod email;
pub mod media;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use email::EmailService;
pub use media::{MediaClient, MediaError};
pub use orders::OrderService;
