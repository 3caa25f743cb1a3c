//! `bazaar-core`: shared domain building blocks for the marketplace catalog.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, ValidationError};
pub use id::{ProductId, UserId};
