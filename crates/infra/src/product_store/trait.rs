use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use bazaar_core::{DomainError, ProductId, UserId, ValidationError};
use bazaar_products::{ImageRef, Product, ProductDraft, ProductPatch};

/// Product store operation error.
///
/// `NotFound` covers both "no such product" and "product owned by someone else";
/// the store never reveals which.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    #[error("product not found")]
    NotFound,

    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(v) => StoreError::Validation(v),
            DomainError::NotFound => StoreError::NotFound,
            DomainError::InvalidId(msg) | DomainError::NotAuthorized(msg) => {
                StoreError::Backend(msg)
            }
        }
    }
}

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedProduct {
    /// The record as committed.
    pub product: Product,
    /// Images the update replaced; empty when the patch did not touch images.
    pub replaced_images: Vec<ImageRef>,
}

/// Durable, schema-validated product persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Validate and insert a new product; the store assigns id and timestamps.
    async fn create(&self, seller_id: UserId, draft: ProductDraft) -> Result<Product, StoreError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Product, StoreError>;

    /// All products of one seller, in creation order. Empty is not an error.
    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, StoreError>;

    /// Every product, in creation order.
    async fn list_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Apply `patch` to the product matching both `id` and `seller_id`.
    async fn update_owned(
        &self,
        id: ProductId,
        seller_id: UserId,
        patch: ProductPatch,
    ) -> Result<UpdatedProduct, StoreError>;

    /// Remove the product matching both `id` and `seller_id`, returning it.
    async fn delete_owned(&self, id: ProductId, seller_id: UserId) -> Result<Product, StoreError>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn create(&self, seller_id: UserId, draft: ProductDraft) -> Result<Product, StoreError> {
        (**self).create(seller_id, draft).await
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Product, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, StoreError> {
        (**self).find_by_seller(seller_id).await
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_all().await
    }

    async fn update_owned(
        &self,
        id: ProductId,
        seller_id: UserId,
        patch: ProductPatch,
    ) -> Result<UpdatedProduct, StoreError> {
        (**self).update_owned(id, seller_id, patch).await
    }

    async fn delete_owned(&self, id: ProductId, seller_id: UserId) -> Result<Product, StoreError> {
        (**self).delete_owned(id, seller_id).await
    }
}
