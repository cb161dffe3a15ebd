//! Field-level trust attestations.
//!
//! A [`Verified<T>`] pairs a piece of profile content with the attestation a
//! reviewer placed on it. Attestations are only ever *created* by reviewers
//! and only ever *revoked* by the update path (see [`crate::trust`]); clients
//! never write them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatekeep_core::{RecordId, ValueObject};

/// Attestation state of a verifiable block.
///
/// # Invariants
/// - `is_verified` implies `verified_at > 0` and `verified_by.is_some()`.
/// - The unverified default is `{ false, None, 0 }`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub is_verified: bool,
    pub verified_by: Option<RecordId>,
    pub verified_at: i64,
}

impl Verification {
    pub fn unverified() -> Self {
        Self::default()
    }

    /// Attestation by `verifier` at `at` (unix seconds, clamped to at least 1).
    pub fn attest(verifier: RecordId, at: DateTime<Utc>) -> Self {
        Self {
            is_verified: true,
            verified_by: Some(verifier),
            verified_at: at.timestamp().max(1),
        }
    }

    /// Whether the attestation invariant holds.
    pub fn is_consistent(&self) -> bool {
        !self.is_verified || (self.verified_at > 0 && self.verified_by.is_some())
    }
}

/// Structural-equality capability required of every verifiable block.
///
/// Change detection for trust revocation compares content only, never the
/// attached [`Verification`]. The default is plain value equality; a block
/// type overrides it only when some of its fields are presentation-only.
pub trait VerifiableContent: ValueObject {
    fn same_content(&self, other: &Self) -> bool {
        self == other
    }
}

/// A value paired with its attestation.
///
/// On the wire the content fields and `verification` sit side by side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Verified<T> {
    #[serde(flatten)]
    pub content: T,
    #[serde(default)]
    pub verification: Verification,
}

impl<T: VerifiableContent> Verified<T> {
    pub fn unverified(content: T) -> Self {
        Self {
            content,
            verification: Verification::unverified(),
        }
    }

    pub fn attested(content: T, verifier: RecordId, at: DateTime<Utc>) -> Self {
        Self {
            content,
            verification: Verification::attest(verifier, at),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verification.is_verified
    }

    /// Content comparison that ignores both sides' attestations.
    pub fn same_content(&self, other: &Self) -> bool {
        self.content.same_content(&other.content)
    }
}
