use serde::Serialize;

use gatekeep_core::{RecordId, Role};

use crate::identity::{Identity, IdentityKind};

/// Whether `identity` holds `required` through any of its groups.
///
/// - No IO
/// - No panics
/// - Flat roles: no role implies another
/// - An absent identity is never authorized
pub fn authorize(identity: Option<&Identity>, required: &Role) -> bool {
    identity.is_some_and(|identity| identity.groups.iter().any(|g| g.grants(required)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// This structure provides transparent, debuggable information about why
/// a request was allowed or denied.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    /// The role that was being checked.
    pub required_role: String,

    /// Whether the authorization was granted.
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// The identity's state, when there was one.
    pub principal: Option<PrincipalState>,

    /// If denied, this explains what was missing.
    pub denial_reason: Option<DenialReason>,
}

/// Current state of the identity being checked.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub id: RecordId,
    pub email: String,
    pub kind: IdentityKind,
    pub groups: Vec<String>,
    /// Union of the groups' roles, sorted.
    pub roles: Vec<String>,
}

/// Detailed reason why authorization was denied.
#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Unauthenticated,
    MissingRole,
}

/// Explain why an authorization decision was made (or would be made).
///
/// Always agrees with [`authorize`].
pub fn explain_authorization(identity: Option<&Identity>, required: &Role) -> AuthorizationExplanation {
    let required_role = required.as_str().to_string();

    let Some(identity) = identity else {
        return AuthorizationExplanation {
            required_role,
            granted: false,
            reason: "No resolved identity for this request".to_string(),
            principal: None,
            denial_reason: Some(DenialReason {
                kind: DenialKind::Unauthenticated,
                message: "The request carried no valid token or its subject is not in the directory"
                    .to_string(),
                suggestions: vec![
                    "Send a fresh identity token in the `token` header".to_string(),
                    "Check that the account exists under one of its alias emails".to_string(),
                ],
            }),
        };
    };

    let principal = PrincipalState {
        id: identity.id,
        email: identity.email.clone(),
        kind: identity.kind,
        groups: identity.groups.iter().map(|g| g.name.clone()).collect(),
        roles: identity.roles().into_iter().map(|r| r.as_str().to_string()).collect(),
    };

    let granting: Vec<&str> = identity
        .groups
        .iter()
        .filter(|g| g.grants(required))
        .map(|g| g.name.as_str())
        .collect();

    if !granting.is_empty() {
        return AuthorizationExplanation {
            reason: format!("Role '{}' granted by group(s) {:?}", required_role, granting),
            required_role,
            granted: true,
            principal: Some(principal),
            denial_reason: None,
        };
    }

    AuthorizationExplanation {
        reason: format!(
            "Identity does not hold role '{}'. Current roles: {:?}",
            required_role, principal.roles
        ),
        denial_reason: Some(DenialReason {
            kind: DenialKind::MissingRole,
            message: format!("Missing required role: '{}'", required_role),
            suggestions: vec![
                format!("Add the identity to a group that lists the '{}' role", required_role),
                format!("Add the '{}' role to one of the groups {:?}", required_role, principal.groups),
            ],
        }),
        required_role,
        granted: false,
        principal: Some(principal),
    }
}
