//! Infrastructure layer: product storage, user directory, image files, config,
//! and the catalog orchestration that composes them.

pub mod assets;
pub mod catalog_service;
pub mod config;
pub mod product_store;
pub mod users;

mod integration_tests;

pub use assets::{AcceptedImages, AssetConfig, AssetError, ImageAssetManager, RawAttachment};
pub use catalog_service::{CatalogError, CatalogService, DeleteConfirmation};
pub use config::{AppConfig, ConfigError};
pub use product_store::{InMemoryProductStore, ProductStore, StoreError, UpdatedProduct};
pub use users::InMemoryUserDirectory;
