//! Integration tests for the Souq API.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database
//! cargo run -p souq-cli -- migrate
//! cargo run -p souq-cli -- seed
//!
//! # Start the API
//! cargo run -p souq-api
//!
//! # Run the (ignored) integration tests
//! cargo test -p souq-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `SOUQ_TEST_BASE_URL` - API base URL (default: `http://localhost:3000`)
//! - `SOUQ_TEST_STAFF_EMAIL` / `SOUQ_TEST_STAFF_PASSWORD` - Credentials of a
//!   staff user (create one with `souq-cli admin create`); staff-only tests
//!   fail without them.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Shared context for driving the API under test.
pub struct TestContext {
    /// HTTP client with a cookie store, so guest tokens persist across calls.
    pub client: Client,
    /// Base URL of the API under test.
    pub base_url: String,
}

impl TestContext {
    /// Create a context pointed at `SOUQ_TEST_BASE_URL`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let base_url = std::env::var("SOUQ_TEST_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self { client, base_url }
    }

    /// Absolute URL for an API path under `/api/v1`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    /// Log in as the configured staff user and return a bearer token.
    ///
    /// # Panics
    ///
    /// Panics when the staff credentials are missing or rejected, with a hint
    /// on how to provision them.
    pub async fn staff_token(&self) -> String {
        let email = std::env::var("SOUQ_TEST_STAFF_EMAIL")
            .expect("set SOUQ_TEST_STAFF_EMAIL (create a user via `souq-cli admin create`)");
        let password = std::env::var("SOUQ_TEST_STAFF_PASSWORD")
            .expect("set SOUQ_TEST_STAFF_PASSWORD");

        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("login request failed");
        assert_eq!(resp.status(), 200, "staff login rejected");

        let body: Value = resp.json().await.expect("login response is JSON");
        body["token"]
            .as_str()
            .expect("login response carries a token")
            .to_owned()
    }

    /// Sign up a throwaway customer, returning `(email, token)`.
    ///
    /// # Panics
    ///
    /// Panics if signup does not answer 201 with a token.
    pub async fn signup_customer(&self) -> (String, String) {
        let email = format!("shopper-{}@test.souq.example", Uuid::new_v4());
        let resp = self
            .client
            .post(self.url("/auth/signup"))
            .json(&json!({
                "name": "Test Shopper",
                "email": email,
                "password": "correct-horse-battery",
            }))
            .send()
            .await
            .expect("signup request failed");
        assert_eq!(resp.status(), 201, "signup rejected");

        let body: Value = resp.json().await.expect("signup response is JSON");
        let token = body["token"]
            .as_str()
            .expect("signup response carries a token")
            .to_owned();
        (email, token)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
