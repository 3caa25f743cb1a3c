//! Caller-supplied product fields for create and update.

use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, ValidationError};

use crate::image::{ImageRef, ensure_image_count};

pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Fields for a new product. `images` is filled in once uploads are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub category: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl ProductDraft {
    /// Validate every scalar field; images are checked separately.
    pub fn validate_fields(&self) -> DomainResult<()> {
        check_name(&self.name)?;
        check_description(&self.description)?;
        check_price(self.price)?;
        check_quantity(self.quantity)?;
        check_category(&self.category)?;
        Ok(())
    }

    /// Full validation, including the 1..=5 image bound.
    pub fn validate(&self) -> DomainResult<()> {
        self.validate_fields()?;
        ensure_image_count(&self.images)
    }
}

/// Partial update. `None` leaves the stored value untouched; `images: Some(_)`
/// replaces the whole image set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ImageRef>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.category.is_none()
            && self.images.is_none()
    }

    /// Validate the scalar fields that are present.
    pub fn validate_fields(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(description) = &self.description {
            check_description(description)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            check_quantity(quantity)?;
        }
        if let Some(category) = &self.category {
            check_category(category)?;
        }
        Ok(())
    }

    /// Full validation: non-empty, present fields in bounds, replacement image set in bounds.
    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch.into());
        }
        self.validate_fields()?;
        if let Some(images) = &self.images {
            ensure_image_count(images)?;
        }
        Ok(())
    }
}

fn check_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::missing("name"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(DomainError::out_of_range(
            "name",
            format!("must be at most {NAME_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

fn check_description(description: &str) -> DomainResult<()> {
    if description.trim().is_empty() {
        return Err(DomainError::missing("description"));
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(DomainError::out_of_range(
            "description",
            format!("must be at most {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

fn check_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::out_of_range("price", "must be a number >= 0"));
    }
    Ok(())
}

fn check_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::out_of_range("quantity", "must be an integer >= 0"));
    }
    Ok(())
}

fn check_category(category: &str) -> DomainResult<()> {
    if category.trim().is_empty() {
        return Err(DomainError::missing("category"));
    }
    Ok(())
}
