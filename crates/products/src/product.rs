use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Entity, ProductId, UserId};

use crate::draft::{ProductDraft, ProductPatch};
use crate::image::ImageRef;

/// Quantities below this (and above zero) are reported as limited stock.
pub const LIMITED_STOCK_THRESHOLD: u64 = 10;

/// Stock level derived from `quantity`; never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LimitedStock,
    OutOfStock,
}

impl StockStatus {
    pub fn from_quantity(quantity: u64) -> Self {
        match quantity {
            0 => StockStatus::OutOfStock,
            q if q < LIMITED_STOCK_THRESHOLD => StockStatus::LimitedStock,
            _ => StockStatus::InStock,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LimitedStock => "limited_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted columns of a product, used to rebuild one from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub category: String,
    pub images: Vec<ImageRef>,
    pub rating: f64,
    pub num_reviews: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog product owned by a single seller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    seller_id: UserId,
    name: String,
    description: String,
    price: f64,
    quantity: u64,
    category: String,
    images: Vec<ImageRef>,
    stock_status: StockStatus,
    rating: f64,
    num_reviews: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a new product from a fully populated draft.
    pub fn create(
        id: ProductId,
        seller_id: UserId,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.validate()?;
        let quantity = draft.quantity as u64;

        Ok(Self {
            id,
            seller_id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            quantity,
            category: draft.category,
            images: draft.images,
            stock_status: StockStatus::from_quantity(quantity),
            rating: 0.0,
            num_reviews: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a product read back from storage, re-checking its invariants.
    pub fn restore(stored: StoredProduct) -> DomainResult<Self> {
        let draft = ProductDraft {
            name: stored.name,
            description: stored.description,
            price: stored.price,
            quantity: stored.quantity,
            category: stored.category,
            images: stored.images,
        };
        draft.validate()?;
        if !(0.0..=5.0).contains(&stored.rating) {
            return Err(DomainError::out_of_range("rating", "must be between 0 and 5"));
        }
        if stored.num_reviews < 0 {
            return Err(DomainError::out_of_range("numReviews", "must be >= 0"));
        }

        let quantity = draft.quantity as u64;
        Ok(Self {
            id: stored.id,
            seller_id: stored.seller_id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            quantity,
            category: draft.category,
            images: draft.images,
            stock_status: StockStatus::from_quantity(quantity),
            rating: stored.rating,
            num_reviews: stored.num_reviews as u64,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    /// Apply a validated patch in place.
    ///
    /// Returns the image set that was replaced, if the patch carried one. The
    /// product is left untouched when validation fails.
    pub fn apply_patch(
        &mut self,
        patch: ProductPatch,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Vec<ImageRef>>> {
        patch.validate()?;

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity as u64;
            self.stock_status = StockStatus::from_quantity(self.quantity);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        let replaced = patch
            .images
            .map(|images| std::mem::replace(&mut self.images, images));

        self.updated_at = now;
        Ok(replaced)
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn stock_status(&self) -> StockStatus {
        self.stock_status
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn num_reviews(&self) -> u64 {
        self.num_reviews
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, seller_id: UserId) -> bool {
        self.seller_id == seller_id
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn owner_id(&self) -> &UserId {
        &self.seller_id
    }
}
