//! Request payload validation.
//!
//! Handlers validate payloads before touching services. Checks are collected
//! into a [`FieldErrors`] accumulator so a response reports every failing
//! field at once, as a list of field/message pairs.
//!
//! ```rust,ignore
//! let mut errors = FieldErrors::new();
//! errors.require_len("name", &payload.name, 2, 100);
//! errors.require_range("discount_percent", payload.discount, 1, 100);
//! errors.finish()?;
//! ```

use serde::Serialize;

use crate::error::ApiError;

/// A single field validation failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Accumulator for field validation failures.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Check that a trimmed string's character count lies in `min..=max`.
    pub fn require_len(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min {
            self.push(field, format!("must be at least {min} characters"));
        } else if len > max {
            self.push(field, format!("must be at most {max} characters"));
        }
    }

    /// Check that an optional string, when present, satisfies `require_len`.
    pub fn require_len_opt(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) {
        if let Some(v) = value {
            self.require_len(field, v, min, max);
        }
    }

    /// Check that an integer lies in `min..=max`.
    pub fn require_range<T: PartialOrd + std::fmt::Display>(
        &mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) {
        if value < min || value > max {
            self.push(field, format!("must be between {min} and {max}"));
        }
    }

    /// Check that a value is strictly positive.
    pub fn require_positive<T: PartialOrd + Default + std::fmt::Display>(
        &mut self,
        field: &str,
        value: T,
    ) {
        if value <= T::default() {
            self.push(field, "must be greater than zero");
        }
    }

    /// Whether any failures have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish validation: `Err(ApiError::Validation)` if anything failed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` carrying all recorded field errors.
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accumulator_passes() {
        assert!(FieldErrors::new().finish().is_ok());
    }

    #[test]
    fn test_require_len_bounds() {
        let mut errors = FieldErrors::new();
        errors.require_len("name", "ok", 2, 10);
        errors.require_len("short", "a", 2, 10);
        errors.require_len("long", &"a".repeat(11), 2, 10);
        let Err(ApiError::Validation(fields)) = errors.finish() else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "short");
        assert_eq!(fields[1].field, "long");
    }

    #[test]
    fn test_require_len_counts_chars_not_bytes() {
        // Arabic text is multi-byte; limits are in characters.
        let mut errors = FieldErrors::new();
        errors.require_len("name", "كتب", 2, 3);
        assert!(errors.finish().is_ok());
    }

    #[test]
    fn test_require_range() {
        let mut errors = FieldErrors::new();
        errors.require_range("discount", 150, 1, 100);
        let Err(ApiError::Validation(fields)) = errors.finish() else {
            panic!("expected validation error");
        };
        assert_eq!(fields[0].message, "must be between 1 and 100");
    }

    #[test]
    fn test_require_positive() {
        let mut errors = FieldErrors::new();
        errors.require_positive("quantity", 0);
        errors.require_positive("fine", 3);
        let Err(ApiError::Validation(fields)) = errors.finish() else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "quantity");
    }

    #[test]
    fn test_collects_all_failures() {
        let mut errors = FieldErrors::new();
        errors.push("a", "bad");
        errors.push("b", "also bad");
        let Err(ApiError::Validation(fields)) = errors.finish() else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 2);
    }
}
