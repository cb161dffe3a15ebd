//! Directory domain module (students, recruiters, groups).
//!
//! This crate holds the directory records and the rules that govern them,
//! implemented as deterministic domain logic: trust attestations and their
//! revocation on change, search semantics, and the typed profile view.
//! Persistence is reached only through the [`DirectoryStore`] port.

pub mod group;
pub mod profile;
pub mod recruiter;
pub mod search;
pub mod store;
pub mod student;
pub mod trust;
pub mod verification;

pub use group::Group;
pub use profile::{Choice, FieldValue, GenericField, PersonalProfile, ProfileSections, StudentProfileView};
pub use recruiter::RecruiterRecord;
pub use search::{Pagination, RollNumberBounds, SearchFilter, StudentPage, StudentQuery};
pub use store::{DirectoryEntry, DirectoryStore, RecruiterEntry, StoreError, StudentEntry};
pub use student::{
    AcademicRecord, ExtrasRecord, Gender, ParentsDetails, ReservationCategory, SchoolResult,
    SocialHandle, SocialPlatform, SocialProfiles, StudentRecord, WorkEntry,
};
pub use trust::{MergeOutcome, TrustInvalidator, WorkExperiencePolicy};
pub use verification::{VerifiableContent, Verification, Verified};
