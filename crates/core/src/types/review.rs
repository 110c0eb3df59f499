//! Product review types and form validation.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Language, ProductId, ReviewId, UserId};

/// Minimum length of a review comment, in UTF-16 code units.
pub const MIN_COMMENT_CHARS: usize = 10;

/// Display name stored for reviewers without a profile name.
pub const ANONYMOUS_USER_NAME: &str = "Utilisateur Anonyme";

const RATING_REQUIRED: &str = "La note est requise";
const RATING_TOO_HIGH: &str = "La note ne peut pas dépasser 5";
const COMMENT_TOO_SHORT: &str = "Le commentaire doit faire au moins 10 caractères.";

/// A star rating between 1 and 5 inclusive.
///
/// ```
/// use ezcentials_core::Rating;
///
/// assert!(Rating::new(5).is_some());
/// assert!(Rating::new(0).is_none());
/// assert!(Rating::new(6).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Create a rating, returning `None` when out of range.
    #[must_use]
    pub const fn new(stars: u8) -> Option<Self> {
        if stars >= Self::MIN && stars <= Self::MAX {
            Some(Self(stars))
        } else {
            None
        }
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars).ok_or_else(|| format!("rating must be between 1 and 5 (got {stars})"))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A stored product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: Rating,
    pub comment: String,
    pub comment_de: String,
    pub comment_fr: String,
    pub comment_en: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// The comment text for a display language, falling back to the original.
    #[must_use]
    pub fn comment_for(&self, language: Language) -> &str {
        let localized = match language {
            Language::De => &self.comment_de,
            Language::Fr => &self.comment_fr,
            Language::En => &self.comment_en,
        };
        if localized.is_empty() {
            &self.comment
        } else {
            localized
        }
    }
}

/// Raw review form input, as submitted by the add and edit forms.
///
/// A missing rating is submitted as `0` (no star selected).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// A review draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub rating: Rating,
    pub comment: String,
}

/// A validation failure attached to a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Errors produced when validating a [`ReviewDraft`].
///
/// All failing fields are reported at once so forms can show every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewValidationError {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ReviewValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "invalid review: {}", messages.join("; "))
    }
}

impl std::error::Error for ReviewValidationError {}

impl ReviewDraft {
    /// Validate the draft.
    ///
    /// ## Constraints
    ///
    /// - `rating` must be between 1 and 5
    /// - `comment` must be at least 10 UTF-16 code units long
    ///
    /// # Errors
    ///
    /// Returns every failing field in a [`ReviewValidationError`].
    ///
    /// ```
    /// use ezcentials_core::ReviewDraft;
    ///
    /// let draft = ReviewDraft { rating: 4, comment: "Sehr gutes Produkt".into() };
    /// assert!(draft.validate().is_ok());
    ///
    /// let draft = ReviewDraft { rating: 0, comment: "kurz".into() };
    /// assert_eq!(draft.validate().unwrap_err().errors.len(), 2);
    /// ```
    pub fn validate(&self) -> Result<ValidReview, ReviewValidationError> {
        let mut errors = Vec::new();

        let rating = Rating::new(self.rating);
        if rating.is_none() {
            errors.push(FieldError {
                field: "rating",
                message: if self.rating < Rating::MIN {
                    RATING_REQUIRED
                } else {
                    RATING_TOO_HIGH
                },
            });
        }

        // Counted in UTF-16 code units, like the browser form validation.
        if self.comment.encode_utf16().count() < MIN_COMMENT_CHARS {
            errors.push(FieldError {
                field: "comment",
                message: COMMENT_TOO_SHORT,
            });
        }

        match rating {
            Some(rating) if errors.is_empty() => Ok(ValidReview {
                rating,
                comment: self.comment.clone(),
            }),
            _ => Err(ReviewValidationError { errors }),
        }
    }
}
