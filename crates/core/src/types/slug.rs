//! URL slug type with Arabic-aware slugification.
//!
//! Catalog entities derive their URL identity from their display name, which
//! is frequently Arabic. Slugs therefore keep Unicode letters and digits
//! (Arabic script included), lowercase Latin characters, strip Arabic
//! diacritics and tatweel, and join words with single dashes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Slug`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SlugError {
    /// The input contained no sluggable characters.
    #[error("name produces an empty slug")]
    Empty,
    /// The resulting slug is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
}

/// Arabic combining marks (tashkeel) that are stripped during slugification.
const TASHKEEL: core::ops::RangeInclusive<char> = '\u{064B}'..='\u{0652}';

/// Tatweel (kashida), a typographic elongation character.
const TATWEEL: char = '\u{0640}';

/// A URL-safe slug derived from an entity name.
///
/// ## Examples
///
/// ```
/// use souq_core::Slug;
///
/// assert_eq!(Slug::new("Summer Collection 2024").unwrap().as_str(), "summer-collection-2024");
/// assert_eq!(Slug::new("أجهزة كهربائية").unwrap().as_str(), "أجهزة-كهربائية");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length in characters.
    pub const MAX_LENGTH: usize = 200;

    /// Build a slug from a display name.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` if the name contains no letters or digits,
    /// and `SlugError::TooLong` if the result exceeds [`Self::MAX_LENGTH`]
    /// characters.
    pub fn new(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        let mut pending_dash = false;

        for c in name.chars() {
            if TASHKEEL.contains(&c) || c == TATWEEL {
                continue;
            }
            if c.is_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                for lower in c.to_lowercase() {
                    out.push(lower);
                }
            } else {
                pending_dash = true;
            }
        }

        if out.is_empty() {
            return Err(SlugError::Empty);
        }

        if out.chars().count() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(out))
    }

    /// Wrap an already-slugified string (e.g. read back from the database).
    #[must_use]
    pub fn from_raw(slug: String) -> Self {
        Self(slug)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_lowercased_and_dashed() {
        let slug = Slug::new("  Gaming  Laptops & Accessories ").expect("valid");
        assert_eq!(slug.as_str(), "gaming-laptops-accessories");
    }

    #[test]
    fn test_arabic_preserved() {
        let slug = Slug::new("ملابس رجالية").expect("valid");
        assert_eq!(slug.as_str(), "ملابس-رجالية");
    }

    #[test]
    fn test_arabic_diacritics_stripped() {
        // "كُتُب" with damma marks slugs the same as bare "كتب"
        let slug = Slug::new("كُتُب").expect("valid");
        assert_eq!(slug.as_str(), "كتب");
    }

    #[test]
    fn test_tatweel_stripped() {
        let slug = Slug::new("عـــروض").expect("valid");
        assert_eq!(slug.as_str(), "عروض");
    }

    #[test]
    fn test_mixed_scripts_and_digits() {
        let slug = Slug::new("iPhone 15 برو").expect("valid");
        assert_eq!(slug.as_str(), "iphone-15-برو");
    }

    #[test]
    fn test_punctuation_collapses_to_single_dash() {
        let slug = Slug::new("a --- b!!c").expect("valid");
        assert_eq!(slug.as_str(), "a-b-c");
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(Slug::new("!!! ---"), Err(SlugError::Empty));
        assert_eq!(Slug::new(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_too_long_rejected() {
        let name = "a ".repeat(250);
        assert!(matches!(Slug::new(&name), Err(SlugError::TooLong { .. })));
    }
}
