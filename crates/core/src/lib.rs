//! `gatekeep-core`: shared building blocks for the directory and auth layers.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod role;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, GroupId, RecordId};
pub use role::Role;
pub use value_object::ValueObject;
