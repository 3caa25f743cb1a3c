//! Catalog operation service.
//!
//! Composes the product store, the user directory and the image asset manager.
//! Every mutation follows the same order:
//!
//! 1. validate the request shape (no IO)
//! 2. resolve the identity to a seller
//! 3. accept images (writes files)
//! 4. commit through the store
//!
//! Steps 1 and 2 fail before any file is written. A store error in step 4
//! releases the files accepted in step 3. A store write that times out or is
//! cancelled may still commit, so its files are kept and logged for
//! reconciliation instead. Nothing is retried.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use bazaar_auth::{AuthzError, Identity, Seller, UserDirectory, assert_is_seller, assert_owns};
use bazaar_core::{DomainError, ProductId, UserId, ValidationError};
use bazaar_products::{ImageRef, MAX_IMAGES, MIN_IMAGES, Product, ProductDraft, ProductPatch};

use crate::assets::{AcceptedImages, AssetError, ImageAssetManager, RawAttachment};
use crate::product_store::{ProductStore, StoreError};

/// Error returned by catalog operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    /// The request was malformed. Nothing was written.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// No such product, or it belongs to another seller.
    #[error("product not found")]
    NotFound,

    /// Persisting an image failed; accepted files were rolled back.
    #[error("image storage failure: {0}")]
    AssetIo(String),

    #[error("store failure: {0}")]
    Store(String),
}

impl From<ValidationError> for CatalogError {
    fn from(value: ValidationError) -> Self {
        CatalogError::Validation(value)
    }
}

impl From<DomainError> for CatalogError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(v) => CatalogError::Validation(v),
            DomainError::NotAuthorized(msg) => CatalogError::NotAuthorized(msg),
            // An id that does not parse cannot name a product.
            DomainError::NotFound | DomainError::InvalidId(_) => CatalogError::NotFound,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(v) => CatalogError::Validation(v),
            StoreError::NotFound => CatalogError::NotFound,
            StoreError::Backend(msg) => CatalogError::Store(msg),
        }
    }
}

impl From<AuthzError> for CatalogError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Directory(e) => CatalogError::Store(e.to_string()),
            denial => CatalogError::NotAuthorized(denial.to_string()),
        }
    }
}

impl From<AssetError> for CatalogError {
    fn from(value: AssetError) -> Self {
        match value {
            AssetError::Validation(v) => CatalogError::Validation(v),
            AssetError::Io(msg) => CatalogError::AssetIo(msg),
            AssetError::Timeout(op) => CatalogError::AssetIo(format!("{op} timed out")),
        }
    }
}

/// Acknowledgement of a committed delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfirmation {
    pub product_id: ProductId,
    /// Local image files removed after the delete committed.
    pub released_files: usize,
}

pub struct CatalogService<S, D> {
    store: S,
    users: D,
    assets: ImageAssetManager,
    io_timeout: Duration,
}

impl<S, D> CatalogService<S, D>
where
    S: ProductStore,
    D: UserDirectory,
{
    pub fn new(store: S, users: D, assets: ImageAssetManager) -> Self {
        let io_timeout = assets.config().io_timeout;
        Self {
            store,
            users,
            assets,
            io_timeout,
        }
    }

    pub fn assets(&self) -> &ImageAssetManager {
        &self.assets
    }

    /// Create a product for the calling seller.
    ///
    /// The product's images are the accepted uploads followed by the external
    /// URLs; any images already on `draft` are replaced.
    #[instrument(
        skip(self, draft, attachments, external_urls),
        fields(seller_id = %identity.id, uploads = attachments.len(), urls = external_urls.len()),
        err
    )]
    pub async fn add_product(
        &self,
        identity: &Identity,
        mut draft: ProductDraft,
        attachments: Vec<RawAttachment>,
        external_urls: Vec<String>,
    ) -> Result<Product, CatalogError> {
        draft.validate_fields()?;
        self.validate_images(&attachments, &external_urls, true)?;

        let seller = self.authorize(identity).await?;

        let external = self.assets.accept_external_urls(external_urls)?;
        let uploads = self.assets.accept_uploads(attachments).await?;
        draft.images = ImageAssetManager::combine(uploads.refs().to_vec(), external);

        let product = self
            .write("store.create", uploads, self.store.create(seller.id(), draft))
            .await?;
        tracing::info!(
            product_id = %product.id_typed(),
            seller = seller.display_name(),
            images = product.images().len(),
            "product created"
        );
        Ok(product)
    }

    /// All products of `seller_id`. A seller with no products yields an empty list.
    #[instrument(skip(self), fields(seller_id = %seller_id), err)]
    pub async fn list_seller_products(&self, seller_id: UserId) -> Result<Vec<Product>, CatalogError> {
        self.timed("store.find_by_seller", self.store.find_by_seller(seller_id))
            .await
    }

    /// One product of `seller_id`; another seller's product is `NotFound`.
    #[instrument(skip(self), fields(seller_id = %seller_id, product_id = %product_id), err)]
    pub async fn get_seller_product(
        &self,
        seller_id: UserId,
        product_id: ProductId,
    ) -> Result<Product, CatalogError> {
        let product = self
            .timed("store.find_by_id", self.store.find_by_id(product_id))
            .await?;
        assert_owns(seller_id, &product).map_err(|_| CatalogError::NotFound)?;
        Ok(product)
    }

    /// Apply `patch` to a product the caller owns.
    ///
    /// Supplying attachments or external URLs replaces the whole image set; the
    /// old local files are released only after the update commits. Images set
    /// on `patch` itself are ignored.
    #[instrument(
        skip(self, patch, attachments, external_urls),
        fields(seller_id = %identity.id, product_id = %product_id, uploads = attachments.len(), urls = external_urls.len()),
        err
    )]
    pub async fn update_seller_product(
        &self,
        identity: &Identity,
        product_id: ProductId,
        mut patch: ProductPatch,
        attachments: Vec<RawAttachment>,
        external_urls: Vec<String>,
    ) -> Result<Product, CatalogError> {
        // Image refs only come from accepted uploads and URLs.
        patch.images = None;
        let replacing_images = !attachments.is_empty() || !external_urls.is_empty();
        if replacing_images {
            patch.validate_fields()?;
            self.validate_images(&attachments, &external_urls, true)?;
        } else {
            patch.validate()?;
        }

        let seller = self.authorize(identity).await?;

        let uploads = if replacing_images {
            let external = self.assets.accept_external_urls(external_urls)?;
            let uploads = self.assets.accept_uploads(attachments).await?;
            patch.images = Some(ImageAssetManager::combine(uploads.refs().to_vec(), external));
            uploads
        } else {
            AcceptedImages::empty()
        };

        let updated = self
            .write(
                "store.update_owned",
                uploads,
                self.store.update_owned(product_id, seller.id(), patch),
            )
            .await?;

        let orphaned: Vec<ImageRef> = updated
            .replaced_images
            .into_iter()
            .filter(|old| !updated.product.images().contains(old))
            .collect();
        let released = self.assets.release(&orphaned).await;

        tracing::info!(released_files = released, "product updated");
        Ok(updated.product)
    }

    /// Delete a product the caller owns and release its local image files.
    ///
    /// The store delete is authoritative; file release failures are only logged.
    #[instrument(skip(self), fields(seller_id = %identity.id, product_id = %product_id), err)]
    pub async fn delete_seller_product(
        &self,
        identity: &Identity,
        product_id: ProductId,
    ) -> Result<DeleteConfirmation, CatalogError> {
        let seller = self.authorize(identity).await?;

        let deleted = self
            .timed(
                "store.delete_owned",
                self.store.delete_owned(product_id, seller.id()),
            )
            .await?;
        let released_files = self.assets.release(deleted.images()).await;

        tracing::info!(released_files, "product deleted");
        Ok(DeleteConfirmation {
            product_id,
            released_files,
        })
    }

    /// Every product in the catalog, in creation order.
    #[instrument(skip(self), err)]
    pub async fn browse_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.timed("store.list_all", self.store.list_all()).await
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        self.timed("store.find_by_id", self.store.find_by_id(product_id))
            .await
    }

    fn validate_images(
        &self,
        attachments: &[RawAttachment],
        external_urls: &[String],
        required: bool,
    ) -> Result<(), ValidationError> {
        self.assets.validate_uploads(attachments)?;
        self.assets.validate_external_urls(external_urls)?;

        let count = attachments.len() + external_urls.len();
        if (required || count > 0) && !(MIN_IMAGES..=MAX_IMAGES).contains(&count) {
            return Err(ValidationError::ImageCount {
                count,
                min: MIN_IMAGES,
                max: MAX_IMAGES,
            });
        }
        Ok(())
    }

    async fn authorize(&self, identity: &Identity) -> Result<Seller, CatalogError> {
        let result = self
            .timed("users.find_user", assert_is_seller(identity, &self.users))
            .await;
        if let Err(CatalogError::NotAuthorized(reason)) = &result {
            tracing::info!(user_id = %identity.id, %reason, "seller check denied");
        }
        result
    }

    /// Run a store write that references `uploads`.
    ///
    /// The files are released only when the store definitely rejected the
    /// write. On timeout, or if this future is dropped mid-write, the write may
    /// still land, so the files are kept and logged.
    async fn write<T>(
        &self,
        operation: &'static str,
        mut uploads: AcceptedImages,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, CatalogError> {
        uploads.mark_in_flight();
        match tokio::time::timeout(self.io_timeout, fut).await {
            Ok(Ok(value)) => {
                uploads.into_refs();
                Ok(value)
            }
            Ok(Err(e)) => {
                let err = CatalogError::from(e);
                if matches!(err, CatalogError::Store(_)) {
                    tracing::error!(operation, error = %err, "store operation failed");
                }
                self.discard(uploads).await;
                Err(err)
            }
            Err(_) => {
                let retained = uploads.into_refs();
                tracing::error!(
                    operation,
                    timeout_ms = self.io_timeout.as_millis() as u64,
                    "operation timed out"
                );
                for image in &retained {
                    tracing::warn!(
                        operation,
                        url = %image.url,
                        "store write outcome unknown; retaining upload for reconciliation"
                    );
                }
                Err(CatalogError::Store(format!("{operation} timed out")))
            }
        }
    }

    /// Release files accepted for an operation that did not commit.
    async fn discard(&self, uploads: AcceptedImages) {
        let refs = uploads.into_refs();
        if refs.is_empty() {
            return;
        }
        let released = self.assets.release(&refs).await;
        tracing::warn!(
            accepted = refs.len(),
            released,
            "released images of uncommitted operation"
        );
    }

    async fn timed<T, E>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, CatalogError>
    where
        CatalogError: From<E>,
    {
        match tokio::time::timeout(self.io_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let err = CatalogError::from(e);
                if matches!(err, CatalogError::Store(_)) {
                    tracing::error!(operation, error = %err, "store operation failed");
                }
                Err(err)
            }
            Err(_) => {
                tracing::error!(operation, timeout_ms = self.io_timeout.as_millis() as u64, "operation timed out");
                Err(CatalogError::Store(format!("{operation} timed out")))
            }
        }
    }
}
