//! Groups: named bundles of roles.

use serde::{Deserialize, Serialize};

use gatekeep_core::{GroupId, Role};

/// A directory group.
///
/// Membership is recorded on the student/recruiter record; the group itself
/// only lists the roles it grants. Roles are flat: a group listing `admin`
/// does not implicitly grant `student`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            name: name.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn grants(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_is_exact_and_flat() {
        let g = Group::new(GroupId::new(), "placement-cell", [Role::ADMIN]);
        assert!(g.grants(&Role::ADMIN));
        assert!(!g.grants(&Role::STUDENT));
        assert!(!g.grants(&Role::new("Admin")));
    }
}
