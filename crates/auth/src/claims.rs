use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims established by signature verification.
///
/// Only the verifier can construct this type, so holding one proves the
/// subject came from a token whose signature was checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedClaims {
    subject: String,
    expiry: DateTime<Utc>,
}

impl VerifiedClaims {
    pub(crate) fn new(subject: String, expiry: DateTime<Utc>) -> Self {
        Self { subject, expiry }
    }

    /// Email-shaped subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }
}

/// Claims as signed by the issuer.
///
/// Issuers that put the email in `email` (Firebase style) take precedence
/// over a plain `sub`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenClaims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
}

impl TokenClaims {
    pub fn subject(&self) -> Option<&str> {
        let present = |s: &&str| !s.is_empty();
        self.email
            .as_deref()
            .filter(present)
            .or_else(|| self.sub.as_deref().filter(present))
    }
}

/// Expiry read from the payload *without* verifying the signature.
///
/// Used only to reject expired tokens early and to report the claimed expiry
/// back to clients; never as a basis for trust.
pub(crate) fn peek_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Exp {
        exp: i64,
    }

    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let Exp { exp } = serde_json::from_slice(&bytes).ok()?;
    DateTime::<Utc>::from_timestamp(exp, 0)
}
