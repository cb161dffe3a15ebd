//! Persistence port for the directory.
//!
//! The directory is served by an external document store (possibly fronted by
//! a read cache). This module defines only the contract; `gatekeep-infra`
//! provides implementations.

use async_trait::async_trait;
use thiserror::Error;

use gatekeep_core::{RecordId, Role};

use crate::group::Group;
use crate::recruiter::RecruiterRecord;
use crate::search::{StudentPage, StudentQuery};
use crate::student::StudentRecord;

/// A record together with its resolved groups.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry<R> {
    pub record: R,
    pub groups: Vec<Group>,
}

impl<R> DirectoryEntry<R> {
    pub fn grants(&self, role: &Role) -> bool {
        self.groups.iter().any(|g| g.grants(role))
    }
}

pub type StudentEntry = DirectoryEntry<StudentRecord>;
pub type RecruiterEntry = DirectoryEntry<RecruiterRecord>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("directory store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Directory store contract.
///
/// Every read takes `no_cache`; when set, implementations bypass any read
/// cache and go to the source of truth.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// First student whose email equals any of `aliases`.
    async fn find_student_by_email_aliases(
        &self,
        aliases: &[String],
        no_cache: bool,
    ) -> Result<Option<StudentEntry>, StoreError>;

    async fn find_recruiter_by_email_aliases(
        &self,
        aliases: &[String],
        no_cache: bool,
    ) -> Result<Option<RecruiterEntry>, StoreError>;

    async fn find_student_by_id(
        &self,
        id: RecordId,
        no_cache: bool,
    ) -> Result<Option<StudentEntry>, StoreError>;

    /// Students belonging to at least one group that grants `role`.
    async fn find_students_by_role(
        &self,
        role: &Role,
        no_cache: bool,
    ) -> Result<Vec<StudentEntry>, StoreError>;

    async fn search_students(
        &self,
        query: &StudentQuery,
        no_cache: bool,
    ) -> Result<StudentPage, StoreError>;

    /// Insert or replace the student with `record.id`.
    async fn persist_student(&self, record: StudentRecord) -> Result<(), StoreError>;
}
