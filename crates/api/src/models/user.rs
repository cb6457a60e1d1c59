//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use souq_core::{Email, UserId, UserRole};

/// A registered user (domain type).
///
/// The password hash never leaves the repository layer; this type is safe to
/// serialize into API responses as-is.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Access role.
    pub role: UserRole,
    /// Whether the account is active. Deactivated accounts cannot log in.
    pub active: bool,
    /// When the password was last changed. Tokens issued before this instant
    /// are rejected by the auth middleware.
    #[serde(skip)]
    pub password_changed_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether a token issued at `issued_at` predates the last password change.
    #[must_use]
    pub fn token_is_stale(&self, issued_at: DateTime<Utc>) -> bool {
        self.password_changed_at
            .is_some_and(|changed| issued_at < changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn user(changed: Option<DateTime<Utc>>) -> User {
        User {
            id: UserId::new(1),
            name: "Test".to_owned(),
            email: Email::parse("t@example.com").expect("valid"),
            phone: None,
            role: UserRole::Customer,
            active: true,
            password_changed_at: changed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_is_stale_after_password_change() {
        let now = Utc::now();
        let u = user(Some(now));
        assert!(u.token_is_stale(now - TimeDelta::minutes(5)));
        assert!(!u.token_is_stale(now + TimeDelta::minutes(5)));
    }

    #[test]
    fn test_token_never_stale_without_change() {
        let u = user(None);
        assert!(!u.token_is_stale(Utc::now()));
    }

    #[test]
    fn test_password_changed_at_not_serialized() {
        let u = user(Some(Utc::now()));
        let json = serde_json::to_value(&u).expect("serialize");
        assert!(json.get("password_changed_at").is_none());
        assert!(json.get("email").is_some());
    }
}
