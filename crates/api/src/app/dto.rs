use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatekeep_auth::{ErrorKind, Identity};
use gatekeep_directory::{DirectoryEntry, Group, RecruiterRecord, StudentRecord};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct StudentListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default, alias = "perPage")]
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
pub struct StudentIdQuery {
    pub id: String,
}

// -------------------------
// Response DTOs
// -------------------------

/// A directory record with its groups expanded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedRecord<'a, R> {
    #[serde(flatten)]
    pub record: &'a R,
    pub group_details: &'a [Group],
}

impl<'a, R> PopulatedRecord<'a, R> {
    pub fn from_entry(entry: &'a DirectoryEntry<R>) -> Self {
        Self {
            record: &entry.record,
            group_details: &entry.groups,
        }
    }
}

pub type StudentView<'a> = PopulatedRecord<'a, StudentRecord>;
pub type RecruiterView<'a> = PopulatedRecord<'a, RecruiterRecord>;

pub fn student_view(identity: &Identity) -> Option<StudentView<'_>> {
    identity.student().map(|record| PopulatedRecord {
        record,
        group_details: &identity.groups,
    })
}

pub fn recruiter_view(identity: &Identity) -> Option<RecruiterView<'_>> {
    identity.recruiter().map(|record| PopulatedRecord {
        record,
        group_details: &identity.groups,
    })
}

#[derive(Debug, Serialize)]
pub struct StudentVerifyResponse<'a> {
    pub student: Option<StudentView<'a>>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub expire: Option<DateTime<Utc>>,
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Serialize)]
pub struct RecruiterVerifyResponse<'a> {
    pub data: Option<RecruiterView<'a>>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub expire: Option<DateTime<Utc>>,
    pub error: Option<ErrorKind>,
    pub email: Option<&'a str>,
    pub status: u16,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct StudentListResponse<'a> {
    pub data: Vec<StudentView<'a>>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct StudentUpdateResponse<'a> {
    pub data: &'a StudentRecord,
    /// Attested blocks the edit invalidated.
    pub revoked: &'a [String],
    pub changed: bool,
}
