use serde::{Deserialize, Serialize};

use bazaar_core::{DomainResult, ValidationError};

/// Fewest images a product may carry.
pub const MIN_IMAGES: usize = 1;

/// Most images a product may carry.
pub const MAX_IMAGES: usize = 5;

/// Reference to one product image, in display order within a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Local storage path or external URL.
    pub url: String,
    /// `true` when the asset store owns the file behind `url`.
    pub is_local: bool,
}

impl ImageRef {
    pub fn local(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_local: true,
        }
    }

    pub fn external(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_local: false,
        }
    }
}

/// Check that an image set fits the per-product bounds.
pub fn ensure_image_count(images: &[ImageRef]) -> DomainResult<()> {
    let count = images.len();
    if !(MIN_IMAGES..=MAX_IMAGES).contains(&count) {
        return Err(ValidationError::ImageCount {
            count,
            min: MIN_IMAGES,
            max: MAX_IMAGES,
        }
        .into());
    }
    Ok(())
}
