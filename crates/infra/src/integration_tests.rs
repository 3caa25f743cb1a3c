//! Integration tests for the catalog pipeline.
//!
//! Tests: CatalogService → UserDirectory → ImageAssetManager → ProductStore
//!
//! Verifies:
//! - Stock status is derived on create and update
//! - Ownership is enforced by the store's conditional operations
//! - No local image file outlives a rejected or cancelled-mid-upload operation
//! - Files of a store write with unknown outcome are kept, never left dangling
//! - Only accepted uploads and URLs become image refs

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use bazaar_auth::{Identity, Role, UserAccount, UserDirectory};
    use bazaar_core::{ProductId, UserId, ValidationError};
    use bazaar_products::{Product, ProductDraft, ProductPatch, StockStatus};

    use crate::assets::{AssetConfig, ImageAssetManager, RawAttachment};
    use crate::catalog_service::{CatalogError, CatalogService};
    use crate::product_store::{InMemoryProductStore, ProductStore, StoreError, UpdatedProduct};
    use crate::users::InMemoryUserDirectory;

    type Service<S> = CatalogService<S, Arc<InMemoryUserDirectory>>;

    struct Harness<S> {
        service: Service<S>,
        users: Arc<InMemoryUserDirectory>,
        uploads: PathBuf,
        _dir: tempfile::TempDir,
    }

    impl<S: ProductStore> Harness<S> {
        fn with_store(store: S, io_timeout: Duration) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let uploads = dir.path().join("uploads");
            let users = Arc::new(InMemoryUserDirectory::new());
            let assets =
                ImageAssetManager::new(AssetConfig::new(uploads.clone()).with_io_timeout(io_timeout));
            Self {
                service: CatalogService::new(store, users.clone(), assets),
                users,
                uploads,
                _dir: dir,
            }
        }

        async fn seller(&self) -> Identity {
            self.account(Role::SELLER).await
        }

        async fn account(&self, role: Role) -> Identity {
            let id = UserId::new();
            self.users
                .register(UserAccount {
                    id,
                    display_name: format!("user-{id}"),
                    role: role.clone(),
                })
                .await
                .unwrap();
            Identity::new(id, role)
        }

        fn files(&self) -> usize {
            files_in(&self.uploads)
        }
    }

    fn harness() -> Harness<Arc<InMemoryProductStore>> {
        Harness::with_store(Arc::new(InMemoryProductStore::new()), Duration::from_secs(5))
    }

    fn files_in(path: &Path) -> usize {
        std::fs::read_dir(path).map(|d| d.count()).unwrap_or(0)
    }

    fn draft(quantity: i64) -> ProductDraft {
        ProductDraft {
            name: "Stoneware mug".to_string(),
            description: "Hand-thrown, 350ml, dishwasher safe.".to_string(),
            price: 24.5,
            quantity,
            category: "kitchen".to_string(),
            images: Vec::new(),
        }
    }

    fn png(n: usize) -> RawAttachment {
        RawAttachment::new(format!("mug-{n}.png"), "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn pngs(count: usize) -> Vec<RawAttachment> {
        (0..count).map(png).collect()
    }

    /// Wraps the in-memory store and fails every write.
    struct FailingWrites(InMemoryProductStore);

    #[async_trait]
    impl ProductStore for FailingWrites {
        async fn create(&self, _: UserId, _: ProductDraft) -> Result<Product, StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }
        async fn find_by_id(&self, id: ProductId) -> Result<Product, StoreError> {
            self.0.find_by_id(id).await
        }
        async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, StoreError> {
            self.0.find_by_seller(seller_id).await
        }
        async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
            self.0.list_all().await
        }
        async fn update_owned(
            &self,
            _: ProductId,
            _: UserId,
            _: ProductPatch,
        ) -> Result<UpdatedProduct, StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }
        async fn delete_owned(&self, id: ProductId, seller_id: UserId) -> Result<Product, StoreError> {
            self.0.delete_owned(id, seller_id).await
        }
    }

    /// A store whose writes never complete.
    struct StalledWrites;

    #[async_trait]
    impl ProductStore for StalledWrites {
        async fn create(&self, _: UserId, _: ProductDraft) -> Result<Product, StoreError> {
            std::future::pending().await
        }
        async fn find_by_id(&self, _: ProductId) -> Result<Product, StoreError> {
            Err(StoreError::NotFound)
        }
        async fn find_by_seller(&self, _: UserId) -> Result<Vec<Product>, StoreError> {
            Ok(Vec::new())
        }
        async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
            Ok(Vec::new())
        }
        async fn update_owned(
            &self,
            _: ProductId,
            _: UserId,
            _: ProductPatch,
        ) -> Result<UpdatedProduct, StoreError> {
            std::future::pending().await
        }
        async fn delete_owned(&self, _: ProductId, _: UserId) -> Result<Product, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn create_derives_stock_status_from_quantity() {
        let h = harness();
        let seller = h.seller().await;

        for (quantity, uploads, expected) in [
            (0, 1, StockStatus::OutOfStock),
            (5, 3, StockStatus::LimitedStock),
            (9, 5, StockStatus::LimitedStock),
            (50, 2, StockStatus::InStock),
        ] {
            let product = h
                .service
                .add_product(&seller, draft(quantity), pngs(uploads), Vec::new())
                .await
                .unwrap();
            assert_eq!(product.stock_status(), expected, "quantity {quantity}");
            assert_eq!(product.images().len(), uploads);
        }
        assert_eq!(h.files(), 1 + 3 + 5 + 2);
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let h = harness();
        let seller = h.seller().await;

        let created = h
            .service
            .add_product(
                &seller,
                draft(12),
                pngs(1),
                vec!["https://cdn.example.com/mug-side.jpg".to_string()],
            )
            .await
            .unwrap();

        let fetched = h
            .service
            .get_seller_product(seller.id, created.id_typed())
            .await
            .unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name(), "Stoneware mug");
        assert_eq!(fetched.price(), 24.5);
        assert_eq!(fetched.quantity(), 12);
        assert_eq!(fetched.category(), "kitchen");
        assert_eq!(fetched.seller_id(), seller.id);
        assert_eq!(fetched.stock_status(), StockStatus::InStock);
        assert_eq!(fetched.rating(), 0.0);
        assert_eq!(fetched.num_reviews(), 0);
        assert!(fetched.images()[0].is_local);
        assert!(!fetched.images()[1].is_local);
    }

    #[tokio::test]
    async fn six_attachments_are_rejected_with_no_files_written() {
        let h = harness();
        let seller = h.seller().await;

        let err = h
            .service
            .add_product(&seller, draft(1), pngs(6), Vec::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CatalogError::Validation(ValidationError::TooManyImages { count: 6, max: 5 })
        );
        assert_eq!(h.files(), 0);
    }

    #[tokio::test]
    async fn uploads_plus_urls_beyond_five_are_rejected() {
        let h = harness();
        let seller = h.seller().await;
        let urls = (0..2).map(|i| format!("https://cdn.example.com/{i}.png")).collect();

        let err = h
            .service
            .add_product(&seller, draft(1), pngs(4), urls)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::ImageCount { count: 6, .. })
        ));
        assert_eq!(h.files(), 0);
    }

    #[tokio::test]
    async fn create_without_images_is_rejected() {
        let h = harness();
        let seller = h.seller().await;

        let err = h
            .service
            .add_product(&seller, draft(1), Vec::new(), Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::ImageCount { count: 0, .. })
        ));
    }

    #[tokio::test]
    async fn non_sellers_are_rejected_before_any_file_is_written() {
        let h = harness();
        let customer = h.account(Role::CUSTOMER).await;

        let err = h
            .service
            .add_product(&customer, draft(1), pngs(2), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotAuthorized(_)));

        // Claims the seller role, but the directory says otherwise.
        let impostor = Identity::new(h.account(Role::CUSTOMER).await.id, Role::SELLER);
        let err = h
            .service
            .add_product(&impostor, draft(1), pngs(2), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotAuthorized(_)));

        let unknown = Identity::seller(UserId::new());
        assert!(matches!(
            h.service.add_product(&unknown, draft(1), pngs(1), Vec::new()).await,
            Err(CatalogError::NotAuthorized(_))
        ));

        assert_eq!(h.files(), 0);
    }

    #[tokio::test]
    async fn failed_create_leaves_no_orphan_files() {
        let h = Harness::with_store(
            FailingWrites(InMemoryProductStore::new()),
            Duration::from_secs(5),
        );
        let seller = h.seller().await;

        let err = h
            .service
            .add_product(&seller, draft(3), pngs(3), Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Store(_)));
        assert_eq!(h.files(), 0);
    }

    #[tokio::test]
    async fn timed_out_create_fails_fast_and_retains_files() {
        let h = Harness::with_store(StalledWrites, Duration::from_millis(50));
        let seller = h.seller().await;

        let err = h
            .service
            .add_product(&seller, draft(3), pngs(2), Vec::new())
            .await
            .unwrap_err();

        // The write may still land, so its files must stay resolvable.
        assert_eq!(err, CatalogError::Store("store.create timed out".to_string()));
        assert_eq!(h.files(), 2);
    }

    #[tokio::test]
    async fn timed_out_update_retains_new_files() {
        let h = Harness::with_store(StalledWrites, Duration::from_millis(50));
        let seller = h.seller().await;

        let err = h
            .service
            .update_seller_product(&seller, ProductId::new(), ProductPatch::default(), pngs(1), Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err, CatalogError::Store("store.update_owned timed out".to_string()));
        assert_eq!(h.files(), 1);
    }

    #[tokio::test]
    async fn cancelled_create_during_store_write_retains_files() {
        let h = Harness::with_store(StalledWrites, Duration::from_secs(30));
        let seller = h.seller().await;

        let outcome = tokio::time::timeout(
            Duration::from_millis(100),
            h.service.add_product(&seller, draft(3), pngs(2), Vec::new()),
        )
        .await;

        assert!(outcome.is_err(), "request future should have been cancelled");
        assert_eq!(h.files(), 2);
    }

    #[tokio::test]
    async fn listing_a_seller_without_products_is_empty_success() {
        let h = harness();
        let seller = h.seller().await;

        assert!(h.service.list_seller_products(seller.id).await.unwrap().is_empty());
        assert!(h.service.list_seller_products(UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn another_sellers_product_is_not_found() {
        let h = harness();
        let owner = h.seller().await;
        let other = h.seller().await;
        let product = h
            .service
            .add_product(&owner, draft(4), pngs(2), Vec::new())
            .await
            .unwrap();
        let id = product.id_typed();

        assert_eq!(
            h.service.get_seller_product(other.id, id).await,
            Err(CatalogError::NotFound)
        );

        let patch = ProductPatch {
            name: Some("Hijacked".to_string()),
            ..ProductPatch::default()
        };
        assert_eq!(
            h.service
                .update_seller_product(&other, id, patch, Vec::new(), Vec::new())
                .await,
            Err(CatalogError::NotFound)
        );
        assert_eq!(
            h.service.delete_seller_product(&other, id).await,
            Err(CatalogError::NotFound)
        );

        assert_eq!(h.service.get_product(id).await.unwrap(), product);
        assert_eq!(h.files(), 2);
    }

    #[tokio::test]
    async fn non_owner_update_with_images_releases_the_new_files() {
        let h = harness();
        let owner = h.seller().await;
        let other = h.seller().await;
        let product = h
            .service
            .add_product(&owner, draft(4), pngs(1), Vec::new())
            .await
            .unwrap();

        let err = h
            .service
            .update_seller_product(&other, product.id_typed(), ProductPatch::default(), pngs(2), Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err, CatalogError::NotFound);
        assert_eq!(h.files(), 1);
        assert_eq!(h.service.get_product(product.id_typed()).await.unwrap(), product);
    }

    #[tokio::test]
    async fn update_without_images_keeps_images_and_recomputes_status() {
        let h = harness();
        let seller = h.seller().await;
        let product = h
            .service
            .add_product(&seller, draft(50), pngs(2), Vec::new())
            .await
            .unwrap();

        let updated = h
            .service
            .update_seller_product(
                &seller,
                product.id_typed(),
                ProductPatch {
                    quantity: Some(0),
                    price: Some(19.0),
                    ..ProductPatch::default()
                },
                Vec::new(),
                Vec::new(),
            )
            .await
            .unwrap();

        assert_eq!(updated.images(), product.images());
        assert_eq!(updated.stock_status(), StockStatus::OutOfStock);
        assert_eq!(updated.price(), 19.0);
        assert_eq!(updated.name(), product.name());
        assert_eq!(h.files(), 2);
    }

    #[tokio::test]
    async fn update_with_new_images_releases_old_local_files() {
        let h = harness();
        let seller = h.seller().await;
        let product = h
            .service
            .add_product(&seller, draft(5), pngs(3), Vec::new())
            .await
            .unwrap();
        assert_eq!(h.files(), 3);

        let updated = h
            .service
            .update_seller_product(
                &seller,
                product.id_typed(),
                ProductPatch::default(),
                pngs(1),
                vec!["https://cdn.example.com/new.gif".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(updated.images().len(), 2);
        assert!(updated.images()[0].is_local);
        assert!(product.images().iter().all(|old| !updated.images().contains(old)));
        assert_eq!(h.files(), 1);
    }

    #[tokio::test]
    async fn caller_supplied_image_refs_are_ignored_on_update() {
        let h = harness();
        let victim = h.seller().await;
        let forger = h.seller().await;
        let theirs = h
            .service
            .add_product(&victim, draft(4), pngs(1), Vec::new())
            .await
            .unwrap();
        let mine = h
            .service
            .add_product(&forger, draft(4), pngs(1), Vec::new())
            .await
            .unwrap();

        let updated = h
            .service
            .update_seller_product(
                &forger,
                mine.id_typed(),
                ProductPatch {
                    name: Some("Renamed mug".to_string()),
                    images: Some(theirs.images().to_vec()),
                    ..ProductPatch::default()
                },
                Vec::new(),
                Vec::new(),
            )
            .await
            .unwrap();
        assert_eq!(updated.images(), mine.images());

        // Images alone are not an update.
        let err = h
            .service
            .update_seller_product(
                &forger,
                mine.id_typed(),
                ProductPatch {
                    images: Some(theirs.images().to_vec()),
                    ..ProductPatch::default()
                },
                Vec::new(),
                Vec::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::Validation(ValidationError::EmptyPatch));

        h.service
            .delete_seller_product(&forger, mine.id_typed())
            .await
            .unwrap();
        let victim_file = Path::new(&theirs.images()[0].url);
        assert!(victim_file.exists());
        assert_eq!(h.files(), 1);
        assert_eq!(h.service.get_product(theirs.id_typed()).await.unwrap(), theirs);
    }

    #[tokio::test]
    async fn failed_update_releases_new_files_and_keeps_old_ones() {
        let h = Harness::with_store(
            FailingWrites(InMemoryProductStore::new()),
            Duration::from_secs(5),
        );
        let seller = h.seller().await;

        let err = h
            .service
            .update_seller_product(&seller, ProductId::new(), ProductPatch::default(), pngs(2), Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Store(_)));
        assert_eq!(h.files(), 0);
    }

    #[tokio::test]
    async fn empty_update_is_a_validation_error() {
        let h = harness();
        let seller = h.seller().await;

        let err = h
            .service
            .update_seller_product(&seller, ProductId::new(), ProductPatch::default(), Vec::new(), Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err, CatalogError::Validation(ValidationError::EmptyPatch));
    }

    #[tokio::test]
    async fn invalid_patch_fields_are_rejected_before_authorization() {
        let h = harness();
        let stranger = Identity::seller(UserId::new());

        let err = h
            .service
            .update_seller_product(
                &stranger,
                ProductId::new(),
                ProductPatch {
                    price: Some(-1.0),
                    ..ProductPatch::default()
                },
                pngs(1),
                Vec::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(ValidationError::OutOfRange { field: "price", .. })));
        assert_eq!(h.files(), 0);
    }

    #[tokio::test]
    async fn delete_twice_succeeds_then_is_not_found() {
        let h = harness();
        let seller = h.seller().await;
        let product = h
            .service
            .add_product(
                &seller,
                draft(2),
                pngs(2),
                vec!["https://cdn.example.com/extra.png".to_string()],
            )
            .await
            .unwrap();

        let confirmation = h
            .service
            .delete_seller_product(&seller, product.id_typed())
            .await
            .unwrap();
        assert_eq!(confirmation.product_id, product.id_typed());
        assert_eq!(confirmation.released_files, 2);
        assert_eq!(h.files(), 0);

        assert_eq!(
            h.service.delete_seller_product(&seller, product.id_typed()).await,
            Err(CatalogError::NotFound)
        );
        assert!(h.service.browse_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn browse_lists_every_seller_in_creation_order() {
        let h = harness();
        let first = h.seller().await;
        let second = h.seller().await;

        let a = h.service.add_product(&first, draft(1), pngs(1), Vec::new()).await.unwrap();
        let b = h.service.add_product(&second, draft(1), pngs(1), Vec::new()).await.unwrap();

        let ids: Vec<_> = h
            .service
            .browse_products()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id_typed())
            .collect();
        assert_eq!(ids, vec![a.id_typed(), b.id_typed()]);
    }
}
