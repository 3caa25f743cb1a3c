//! Products domain module (seller-owned catalog records).
//!
//! This crate contains the Product entity and its field rules, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod draft;
pub mod image;
pub mod product;

pub use draft::{ProductDraft, ProductPatch};
pub use image::{ImageRef, MAX_IMAGES, MIN_IMAGES};
pub use product::{Product, StockStatus};
