//! Infrastructure layer: issuer key fetching and directory store adapters.

pub mod directory_store;
pub mod jwks;

pub use directory_store::{CachedDirectoryStore, InMemoryDirectoryStore};
pub use jwks::{GOOGLE_SECURETOKEN_JWKS_URL, HttpJwksFetcher};
