use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried by an identity.
///
/// Roles are opaque strings at this layer; only `seller` carries meaning for the
/// catalog write path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SELLER: Role = Role(Cow::Borrowed("seller"));
    pub const CUSTOMER: Role = Role(Cow::Borrowed("customer"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_seller(&self) -> bool {
        self.as_str() == "seller"
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
