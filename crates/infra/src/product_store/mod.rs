//! Seller-scoped product persistence boundary.
//!
//! Every mutation is keyed on product id *and* seller id in a single conditional
//! operation, so ownership is checked and applied atomically.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProductStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresProductStore;
pub use r#trait::{ProductStore, StoreError, UpdatedProduct};
