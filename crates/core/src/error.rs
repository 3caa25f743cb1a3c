//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Structured reasons a request's shape was rejected.
///
/// Every image-type, image-count and field-bound rejection goes through this
/// type, so callers can match on the kind instead of parsing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// A field was present but outside its allowed bounds.
    #[error("{field} {reason}")]
    OutOfRange { field: &'static str, reason: String },

    /// An attachment's MIME type and extension did not both name an allowed image type.
    #[error("invalid image type for '{file_name}': only jpeg, jpg, png and gif are allowed")]
    InvalidImageType { file_name: String },

    /// More attachments than the configured maximum.
    #[error("too many images: {count} supplied, at most {max} allowed")]
    TooManyImages { count: usize, max: usize },

    /// The final image set is empty or larger than the product limit.
    #[error("a product needs between {min} and {max} images, got {count}")]
    ImageCount { count: usize, min: usize, max: usize },

    /// An external image URL was not an absolute http(s) URL.
    #[error("invalid image url '{url}'")]
    InvalidImageUrl { url: String },

    /// An update carried no fields and no images.
    #[error("update contains no changes")]
    EmptyPatch,
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, ownership). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found, or is not visible to the caller.
    #[error("not found")]
    NotFound,

    /// The acting identity may not perform the operation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),
}

impl DomainError {
    pub fn missing(field: &'static str) -> Self {
        Self::Validation(ValidationError::MissingField { field })
    }

    pub fn out_of_range(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation(ValidationError::OutOfRange {
            field,
            reason: reason.into(),
        })
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_authorized(msg: impl Into<String>) -> Self {
        Self::NotAuthorized(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
