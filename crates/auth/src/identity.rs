//! Resolution of a verified subject into a directory identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use gatekeep_core::{RecordId, Role};
use gatekeep_directory::{
    DirectoryStore, Group, RecruiterEntry, RecruiterRecord, StudentEntry, StudentRecord,
};

use crate::alias::AliasDomains;
use crate::error::ErrorKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Student,
    Recruiter,
}

/// The directory record an identity was resolved from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Student(Box<StudentRecord>),
    Recruiter(RecruiterRecord),
}

/// A resolved caller. Request-scoped; owned by the [`crate::Session`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: RecordId,
    pub email: String,
    pub kind: IdentityKind,
    pub groups: Vec<Group>,
    pub profile: Profile,
}

impl Identity {
    pub fn from_student(entry: StudentEntry) -> Self {
        Self {
            id: entry.record.id,
            email: entry.record.email.clone(),
            kind: IdentityKind::Student,
            groups: entry.groups,
            profile: Profile::Student(Box::new(entry.record)),
        }
    }

    pub fn from_recruiter(entry: RecruiterEntry) -> Self {
        Self {
            id: entry.record.id,
            email: entry.record.email.clone(),
            kind: IdentityKind::Recruiter,
            groups: entry.groups,
            profile: Profile::Recruiter(entry.record),
        }
    }

    /// Union of the roles granted by all groups.
    pub fn roles(&self) -> BTreeSet<&Role> {
        self.groups.iter().flat_map(|g| g.roles.iter()).collect()
    }

    pub fn student(&self) -> Option<&StudentRecord> {
        match &self.profile {
            Profile::Student(record) => Some(&**record),
            Profile::Recruiter(_) => None,
        }
    }

    pub fn recruiter(&self) -> Option<&RecruiterRecord> {
        match &self.profile {
            Profile::Recruiter(record) => Some(record),
            Profile::Student(_) => None,
        }
    }
}

/// Looks up the directory record behind a verified subject.
///
/// Read-only: never writes to the store.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn DirectoryStore>,
    aliases: AliasDomains,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn DirectoryStore>, aliases: AliasDomains) -> Self {
        Self { store, aliases }
    }

    pub fn aliases(&self) -> &AliasDomains {
        &self.aliases
    }

    pub async fn resolve(
        &self,
        subject: &str,
        kind: IdentityKind,
        required_role: &Role,
        no_cache: bool,
    ) -> Result<Identity, ErrorKind> {
        let aliases: Vec<String> = self.aliases.expand(subject).into_iter().collect();

        let identity = match kind {
            IdentityKind::Student => self
                .store
                .find_student_by_email_aliases(&aliases, no_cache)
                .await?
                .map(Identity::from_student),
            IdentityKind::Recruiter => self
                .store
                .find_recruiter_by_email_aliases(&aliases, no_cache)
                .await?
                .map(Identity::from_recruiter),
        };

        let Some(identity) = identity else {
            tracing::debug!(?kind, aliases = aliases.len(), "no directory record for subject");
            return Err(ErrorKind::NotFound);
        };

        if !identity.groups.iter().any(|g| g.grants(required_role)) {
            tracing::debug!(
                id = %identity.id,
                required_role = %required_role,
                "directory record lacks required role"
            );
            return Err(ErrorKind::RoleMismatch);
        }

        Ok(identity)
    }
}
