use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for group-based authorization.
///
/// Roles are flat, opaque strings: holding one role never implies another.
/// Groups list the roles they grant; see `gatekeep_directory::Group`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const STUDENT: Role = Role(Cow::Borrowed("student"));
    pub const RECRUITER: Role = Role(Cow::Borrowed("recruiter"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Training & placement representative.
    pub const TPR: Role = Role(Cow::Borrowed("tpr"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
