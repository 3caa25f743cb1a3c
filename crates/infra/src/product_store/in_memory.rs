use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use bazaar_auth::assert_owns;
use bazaar_core::{ProductId, UserId};
use bazaar_products::{Product, ProductDraft, ProductPatch};

use super::r#trait::{ProductStore, StoreError, UpdatedProduct};

/// In-memory product store.
///
/// Intended for tests/dev. Records are kept in insertion order; the ownership
/// filter and the mutation run under one write lock.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(format!("product store lock poisoned: {e}"))
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn create(&self, seller_id: UserId, draft: ProductDraft) -> Result<Product, StoreError> {
        let product = Product::create(ProductId::new(), seller_id, draft, Utc::now())?;

        let mut products = self.products.write().map_err(poisoned)?;
        products.push(product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Product, StoreError> {
        let products = self.products.read().map_err(poisoned)?;
        products
            .iter()
            .find(|p| p.id_typed() == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(poisoned)?;
        Ok(products
            .iter()
            .filter(|p| p.is_owned_by(seller_id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(poisoned)?;
        Ok(products.clone())
    }

    async fn update_owned(
        &self,
        id: ProductId,
        seller_id: UserId,
        patch: ProductPatch,
    ) -> Result<UpdatedProduct, StoreError> {
        let mut products = self.products.write().map_err(poisoned)?;
        let product = products
            .iter_mut()
            .find(|p| p.id_typed() == id && assert_owns(seller_id, &**p).is_ok())
            .ok_or(StoreError::NotFound)?;

        let replaced = product.apply_patch(patch, Utc::now())?;
        Ok(UpdatedProduct {
            product: product.clone(),
            replaced_images: replaced.unwrap_or_default(),
        })
    }

    async fn delete_owned(&self, id: ProductId, seller_id: UserId) -> Result<Product, StoreError> {
        let mut products = self.products.write().map_err(poisoned)?;
        let idx = products
            .iter()
            .position(|p| p.id_typed() == id && assert_owns(seller_id, p).is_ok())
            .ok_or(StoreError::NotFound)?;
        Ok(products.remove(idx))
    }
}
