//! Authentication service.
//!
//! Password auth with Argon2id hashing, stateless bearer JWTs, and an
//! emailed-code password-reset flow (request code → verify code → set new
//! password). Tokens carry only the user ID and timestamps; every request
//! reloads the user so deactivation and password changes take effect
//! immediately.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use souq_core::{Email, UserId, UserRole};

use crate::config::JwtConfig;
use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a password-reset code stays valid.
const RESET_CODE_TTL_MINUTES: i64 = 10;

/// JWT claims carried by bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: i32,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Issued-at as a `DateTime`.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }
}

/// Authentication service.
///
/// Handles registration, login, token issue/verify, and password reset.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt: &'a JwtConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt: &'a JwtConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    // =========================================================================
    // Registration & Login
    // =========================================================================

    /// Register a new customer account and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid,
    /// `AuthError::WeakPassword` if the password doesn't meet requirements,
    /// and `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, phone, &password_hash, UserRole::Customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// and `AuthError::AccountDisabled` for deactivated accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_auth_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Issue a signed bearer token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue_token(&self, user_id: UserId) -> Result<String, AuthError> {
        issue_token(self.jwt, user_id)
    }

    /// Decode and validate a bearer token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for malformed, badly-signed, or
    /// expired tokens.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        verify_token(self.jwt, token)
    }

    /// Authenticate a bearer token all the way to a live user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for bad tokens,
    /// `AuthError::StaleToken` for tokens minted before the last password
    /// change, and `AuthError::AccountDisabled` for deactivated accounts.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.verify_token(token)?;
        let user = self
            .users
            .get_by_id(UserId::new(claims.sub))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }
        if user.token_is_stale(claims.issued_at()) {
            return Err(AuthError::StaleToken);
        }

        Ok(user)
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Update profile fields. `None` fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a bad new email and
    /// `AuthError::UserAlreadyExists` if the new email is taken.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = email.map(Email::parse).transpose()?;
        self.users
            .update_profile(user_id, name, email.as_ref(), phone)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Change password after re-verifying the current one. Returns a fresh
    /// token since old ones become stale.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong and `AuthError::WeakPassword` if the new one is unacceptable.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<String, AuthError> {
        let (_, password_hash) = self
            .users
            .get_auth_by_email(&user.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(current_password, &password_hash)?;

        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;
        self.users.update_password(user.id, &new_hash).await?;

        self.issue_token(user.id)
    }

    /// Deactivate an account. Outstanding tokens stop working immediately.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn deactivate(&self, user_id: UserId) -> Result<(), AuthError> {
        self.users.set_active(user_id, false).await?;
        Ok(())
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Begin the password-reset flow for an email address.
    ///
    /// Generates a 6-digit code, stores its digest with a 10-minute expiry,
    /// and returns the user plus the plain code for the mailer. Returns
    /// `Ok(None)` for unknown emails so routes don't leak account existence.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let email = Email::parse(email)?;
        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let code = generate_reset_code();
        let expires_at = Utc::now() + TimeDelta::minutes(RESET_CODE_TTL_MINUTES);
        self.users
            .set_reset_code(user.id, &sha256_hex(&code), expires_at)
            .await?;

        Ok(Some((user, code)))
    }

    /// Verify a password-reset code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetCode` if no code is outstanding or it
    /// doesn't match, and `AuthError::ResetCodeExpired` past the deadline.
    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidResetCode)?;

        let state = self
            .users
            .get_reset_code(user.id)
            .await?
            .ok_or(AuthError::InvalidResetCode)?;

        if state.expires_at <= Utc::now() {
            return Err(AuthError::ResetCodeExpired);
        }
        if state.code_hash != sha256_hex(code.trim()) {
            return Err(AuthError::InvalidResetCode);
        }

        self.users.mark_reset_verified(user.id).await?;
        Ok(())
    }

    /// Complete the password-reset flow with a new password. Requires a
    /// previously verified, unexpired code. Returns a fresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ResetNotVerified` if the code wasn't verified,
    /// `AuthError::ResetCodeExpired` past the deadline, and
    /// `AuthError::WeakPassword` for unacceptable passwords.
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let state = self
            .users
            .get_reset_code(user.id)
            .await?
            .ok_or(AuthError::ResetNotVerified)?;
        if !state.verified {
            return Err(AuthError::ResetNotVerified);
        }
        if state.expires_at <= Utc::now() {
            return Err(AuthError::ResetCodeExpired);
        }

        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;
        self.users.update_password(user.id, &new_hash).await?;

        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }
}

/// Issue a signed bearer token for a user.
///
/// # Errors
///
/// Returns `AuthError::TokenSigning` if encoding fails.
pub fn issue_token(jwt: &JwtConfig, user_id: UserId) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.as_i32(),
        iat: now.timestamp(),
        exp: (now + TimeDelta::hours(jwt.ttl_hours)).timestamp(),
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.expose_secret().as_bytes()),
    )?;
    Ok(token)
}

/// Decode and validate a bearer token's signature and expiry.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` for malformed, badly-signed, or expired
/// tokens.
pub fn verify_token(jwt: &JwtConfig, token: &str) -> Result<Claims, AuthError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// Generate a 6-digit reset code.
fn generate_reset_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..=999_999);
    code.to_string()
}

/// Hex-encoded SHA-256 digest.
fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: SecretString::from("k9#mQ2$vX7!pL4@nR8%tW3^zB6&cF1*d"),
            ttl_hours: 72,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let jwt = jwt_config();
        let token = issue_token(&jwt, UserId::new(42)).expect("issue");
        let claims = verify_token(&jwt, &token).expect("verify");
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = issue_token(&jwt_config(), UserId::new(1)).expect("issue");
        let other = JwtConfig {
            secret: SecretString::from("a0!bC1@dE2#fG3$hJ4%kL5^mN6&pQ7*r"),
            ttl_hours: 72,
        };
        assert!(matches!(
            verify_token(&other, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_rejects_garbage() {
        assert!(matches!(
            verify_token(&jwt_config(), "not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(verify_password("wrong password", &hash).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_generate_reset_code_is_six_digits() {
        for _ in 0..32 {
            let code = generate_reset_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_sha256_hex_is_stable() {
        assert_eq!(
            sha256_hex("123456"),
            "8d969eef6ecad3c29a3a629280e686cf0c3f5d5a86aff3ca12020c923adc6c92"
        );
    }
}
