//! `bazaar-auth`: identity contract and seller authorization checks.
//!
//! This crate is intentionally decoupled from HTTP and storage: user lookups go
//! through the [`UserDirectory`] trait.

pub mod authorize;
pub mod claims;
pub mod directory;
pub mod identity;
pub mod roles;

pub use authorize::{AuthzError, Seller, assert_is_seller, assert_owns};
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use directory::{DirectoryError, UserAccount, UserDirectory};
pub use identity::Identity;
pub use roles::Role;
