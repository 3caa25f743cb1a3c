use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use crate::Role;

/// Verified identity of the caller, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn seller(id: UserId) -> Self {
        Self::new(id, Role::SELLER)
    }
}
