//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Resolve the database URL from `SOUQ_DATABASE_URL`, falling back to the
/// generic `DATABASE_URL` set by managed-postgres attach.
pub(crate) fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    std::env::var("SOUQ_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}

/// Neither `SOUQ_DATABASE_URL` nor `DATABASE_URL` is set.
#[derive(Debug, thiserror::Error)]
#[error("missing environment variable: SOUQ_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;
