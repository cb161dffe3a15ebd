//! Recruiter directory record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gatekeep_core::{CompanyId, GroupId, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecruiterRecord {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub company: CompanyId,
    pub is_active: bool,
    pub groups: Vec<GroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecruiterRecord {
    pub fn new(id: RecordId, email: impl Into<String>, company: CompanyId) -> Self {
        Self {
            id,
            email: email.into(),
            company,
            is_active: true,
            ..Self::default()
        }
    }
}
