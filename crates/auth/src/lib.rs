//! `gatekeep-auth`: the trust boundary between bearer tokens and the directory.
//!
//! This crate is decoupled from HTTP and storage: the issuer's keys arrive
//! through [`KeySetFetcher`] and directory records through
//! `gatekeep_directory::DirectoryStore`.

pub mod alias;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod identity;
pub mod keyset;
pub mod session;
pub mod verifier;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use alias::AliasDomains;
pub use authorize::{AuthorizationExplanation, DenialKind, authorize, explain_authorization};
pub use claims::VerifiedClaims;
pub use error::{ErrorClass, ErrorKind};
pub use identity::{Identity, IdentityKind, IdentityResolver, Profile};
pub use keyset::{KeySetCache, KeySetError, KeySetFetcher, SigningKeySet};
pub use session::Session;
pub use verifier::{TokenRejection, TokenVerifier, VerifierConfig};
