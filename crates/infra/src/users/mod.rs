//! Registered-account storage backing `bazaar_auth::UserDirectory`.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryUserDirectory;
#[cfg(feature = "postgres")]
pub use postgres::PostgresUserDirectory;
