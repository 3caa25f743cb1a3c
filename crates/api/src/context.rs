use bazaar_auth::{Identity, Role};
use bazaar_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    identity: Identity,
}

impl IdentityContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id
    }

    pub fn role(&self) -> &Role {
        &self.identity.role
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
