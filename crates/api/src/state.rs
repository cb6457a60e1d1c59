//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::models::Product;
use crate::services::{EmailService, MediaClient};

/// How long product detail reads stay cached.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(60);

/// How many product entries the cache holds.
const PRODUCT_CACHE_CAPACITY: u64 = 1_000;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("media client error: {0}")]
    Media(#[from] crate::services::MediaError),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    media: MediaClient,
    email: EmailService,
    product_cache: Cache<String, Arc<Product>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the media client or SMTP transport cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let media = MediaClient::new(&config.media)?;
        let email = EmailService::new(config.email.as_ref())?;
        let product_cache = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                media,
                email,
                product_cache,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the media-storage client.
    #[must_use]
    pub fn media(&self) -> &MediaClient {
        &self.inner.media
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the product detail cache, keyed by slug.
    #[must_use]
    pub fn product_cache(&self) -> &Cache<String, Arc<Product>> {
        &self.inner.product_cache
    }

    /// Drop a product from the detail cache after a mutation.
    pub async fn invalidate_product(&self, slug: &str) {
        self.inner.product_cache.invalidate(slug).await;
    }
}
