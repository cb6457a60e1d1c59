//! Staff user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a manager with a generated password
//! souq-cli admin create -e manager@example.com -n "Store Manager"
//!
//! # Create an admin with a chosen password
//! souq-cli admin create -e admin@example.com -n "Admin" -r admin -p 'S0me-Str0ng-Pass'
//! ```
//!
//! The generated password is printed once; the user should change it through
//! `PUT /api/v1/auth/change-password` after first login.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use rand::Rng;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use souq_core::{Email, UserRole};

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 16;

/// Alphabet for generated passwords (unambiguous characters only).
const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghjkmnpqrstuvwxyzABCDEFGHJKMNPQRSTUVWXYZ23456789!@#$%^&*";

/// Errors that can occur during staff management.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No database URL in the environment.
    #[error(transparent)]
    MissingEnvVar(#[from] super::MissingDatabaseUrl),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Role is not a staff role.
    #[error("invalid role: {0}. Valid roles: manager, admin")]
    InvalidRole(String),

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// A user with this email already exists.
    #[error("user already exists with email: {0}")]
    UserExists(String),

    /// Password hashing failed.
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Create a new staff user.
///
/// # Arguments
///
/// * `email` - Email address
/// * `name` - Display name
/// * `role` - `manager` or `admin`
/// * `password` - Chosen password; a random one is generated when `None`
///
/// # Errors
///
/// Returns `AdminError` for invalid input, a duplicate email, or database
/// failures.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<&str>,
) -> Result<i32, AdminError> {
    dotenvy::dotenv().ok();

    let role: UserRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    if !role.is_staff() {
        return Err(AdminError::InvalidRole(role.to_string()));
    }

    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating staff user: {} ({})", email, role);

    let existing: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(AdminError::UserExists(email.as_str().to_owned()));
    }

    let (password, generated) = match password {
        Some(p) => (p.to_owned(), false),
        None => (generate_password(), true),
    };
    let password_hash = hash_password(&password)?;

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash, role) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(name)
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(role.as_str())
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        "Staff user created! ID: {}, Email: {}, Role: {}",
        user_id,
        email,
        role
    );
    if generated {
        tracing::info!("Generated password: {}", password);
        tracing::warn!("Store it now; it is not recoverable. Change it after first login.");
    }

    Ok(user_id)
}

/// Hash a password with Argon2id, matching the API's verification.
fn hash_password(password: &str) -> Result<String, AdminError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AdminError::Hash(e.to_string()))
}

/// Generate a random password from the unambiguous alphabet.
fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_PASSWORD_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_ALPHABET.len());
            char::from(PASSWORD_ALPHABET[idx])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password_length_and_alphabet() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_hash_password_produces_phc_string() {
        let hash = hash_password("correct horse battery staple").expect("hashes");
        assert!(hash.starts_with("$argon2id$"));
    }
}
