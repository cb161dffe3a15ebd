use std::sync::Arc;

use gatekeep_auth::{ErrorKind, Identity, Session};
use gatekeep_core::Role;

/// Session context for a request.
///
/// Inserted by the session middleware; present on every `/api/student` route.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session: Arc<Session>,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn no_cache(&self) -> bool {
        self.session.no_cache()
    }

    pub fn require(&self, role: &Role) -> Result<&Identity, ErrorKind> {
        self.session.require(role)
    }
}
