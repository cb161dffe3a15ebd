//! Per-request authentication state.

use chrono::{DateTime, Utc};

use gatekeep_core::Role;

use crate::authorize::authorize;
use crate::error::ErrorKind;
use crate::identity::{Identity, IdentityKind, IdentityResolver};
use crate::verifier::TokenVerifier;

#[derive(Debug, Clone, PartialEq)]
enum State {
    Anonymous,
    Authenticated(Identity),
    /// The single terminal error of this request.
    Failed(ErrorKind),
}

/// Request-scoped holder of the resolved identity or the error that
/// prevented resolving it. Never both.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: State,
    /// Expiry the token claimed, verified or not.
    expiry: Option<DateTime<Utc>>,
    no_cache: bool,
}

impl Session {
    pub fn anonymous(no_cache: bool) -> Self {
        Self {
            state: State::Anonymous,
            expiry: None,
            no_cache,
        }
    }

    pub fn authenticated(identity: Identity, expiry: DateTime<Utc>, no_cache: bool) -> Self {
        Self {
            state: State::Authenticated(identity),
            expiry: Some(expiry),
            no_cache,
        }
    }

    pub fn failed(error: ErrorKind, claimed_expiry: Option<DateTime<Utc>>, no_cache: bool) -> Self {
        Self {
            state: State::Failed(error),
            expiry: claimed_expiry,
            no_cache,
        }
    }

    /// Verify `token` and resolve its subject as `kind` holding `role`.
    ///
    /// A missing token yields an anonymous session; every failure is
    /// captured in the session rather than returned.
    pub async fn establish(
        verifier: &TokenVerifier,
        resolver: &IdentityResolver,
        token: Option<&str>,
        kind: IdentityKind,
        role: &Role,
        no_cache: bool,
    ) -> Self {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Self::anonymous(no_cache);
        };

        let claims = match verifier.verify(token, no_cache).await {
            Ok(claims) => claims,
            Err(rejection) => return Self::failed(rejection.kind, rejection.claimed_expiry, no_cache),
        };

        match resolver.resolve(claims.subject(), kind, role, no_cache).await {
            Ok(identity) => Self::authenticated(identity, claims.expiry(), no_cache),
            Err(error) => Self::failed(error, Some(claims.expiry()), no_cache),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            State::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn into_identity(self) -> Option<Identity> {
        match self.state {
            State::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self.state {
            State::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    pub fn no_cache(&self) -> bool {
        self.no_cache
    }

    pub fn authorize(&self, role: &Role) -> bool {
        authorize(self.identity(), role)
    }

    /// The identity, provided it holds `role`.
    ///
    /// Fails with the session's own error when resolution failed, with
    /// `MalformedToken` when no token was sent, and with `RoleMismatch` when
    /// the identity lacks `role`.
    pub fn require(&self, role: &Role) -> Result<&Identity, ErrorKind> {
        match &self.state {
            State::Failed(error) => Err(*error),
            State::Anonymous => Err(ErrorKind::MalformedToken),
            State::Authenticated(identity) if authorize(Some(identity), role) => Ok(identity),
            State::Authenticated(_) => {
                tracing::debug!(required_role = %role, "session lacks required role");
                Err(ErrorKind::RoleMismatch)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeep_core::{GroupId, RecordId};
    use gatekeep_directory::{DirectoryEntry, Group, StudentRecord};

    fn student(roles: &[Role]) -> Identity {
        Identity::from_student(DirectoryEntry {
            record: StudentRecord::new(RecordId::new(), "a@iitbhu.ac.in", "Asha"),
            groups: vec![Group::new(GroupId::new(), "g", roles.iter().cloned())],
        })
    }

    #[test]
    fn failed_session_reports_its_error_and_no_identity() {
        let session = Session::failed(ErrorKind::Expired, None, false);
        assert_eq!(session.error(), Some(ErrorKind::Expired));
        assert!(session.identity().is_none());
        assert_eq!(session.require(&Role::STUDENT).unwrap_err(), ErrorKind::Expired);
        assert!(!session.authorize(&Role::STUDENT));
    }

    #[test]
    fn anonymous_session_is_unauthenticated() {
        let session = Session::anonymous(true);
        assert!(session.no_cache());
        assert_eq!(session.error(), None);
        assert_eq!(session.require(&Role::STUDENT).unwrap_err(), ErrorKind::MalformedToken);
    }

    #[test]
    fn require_checks_role() {
        let session = Session::authenticated(student(&[Role::STUDENT, Role::TPR]), Utc::now(), false);
        assert!(session.require(&Role::TPR).is_ok());
        assert_eq!(session.require(&Role::ADMIN).unwrap_err(), ErrorKind::RoleMismatch);
        assert_eq!(session.error(), None);
    }
}
