//! Seller and ownership checks for catalog mutations.
//!
//! - No transport concerns
//! - No panics
//! - Lookups only through [`UserDirectory`]

use thiserror::Error;

use bazaar_core::{Entity, UserId};

use crate::{DirectoryError, Identity, UserDirectory};

/// An identity that has been confirmed to belong to a registered seller.
///
/// Only [`assert_is_seller`] constructs this, so holding one is proof of the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seller {
    id: UserId,
    display_name: String,
}

impl Seller {
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("only sellers can manage products")]
    NotSeller,

    #[error("unknown user")]
    UnknownUser,

    #[error("product belongs to another seller")]
    NotOwner,

    /// The directory could not be consulted; this is a server fault, not a denial.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl AuthzError {
    /// `true` for decisions against the caller, `false` for infrastructure faults.
    pub fn is_denial(&self) -> bool {
        !matches!(self, AuthzError::Directory(_))
    }
}

/// Resolve `identity` to a registered seller.
///
/// A claimed non-seller role is rejected without a lookup; otherwise the
/// directory's stored role is authoritative.
pub async fn assert_is_seller<D>(identity: &Identity, directory: &D) -> Result<Seller, AuthzError>
where
    D: UserDirectory + ?Sized,
{
    if !identity.role.is_seller() {
        return Err(AuthzError::NotSeller);
    }

    let account = directory
        .find_user(identity.id)
        .await?
        .ok_or(AuthzError::UnknownUser)?;

    if !account.role.is_seller() {
        tracing::warn!(user_id = %identity.id, role = %account.role, "identity claims seller but account is not one");
        return Err(AuthzError::NotSeller);
    }

    Ok(Seller {
        id: account.id,
        display_name: account.display_name,
    })
}

/// Check that `seller_id` owns `entity`.
///
/// Callers that go on to mutate must evaluate this under the same lock or
/// statement as the write.
pub fn assert_owns<E: Entity>(seller_id: UserId, entity: &E) -> Result<(), AuthzError> {
    if *entity.owner_id() != seller_id {
        return Err(AuthzError::NotOwner);
    }
    Ok(())
}
