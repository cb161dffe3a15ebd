//! Error taxonomy for the trust-verification layer.

use serde::Serialize;
use thiserror::Error;

use gatekeep_directory::StoreError;

use crate::keyset::KeySetError;

/// Broad class of a failure, used for status mapping and logging.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The caller must re-authenticate.
    Authentication,
    /// The caller is known but not allowed.
    Authorization,
    /// A collaborator (issuer, store) failed.
    Infrastructure,
}

/// Every failure a request can hit while establishing identity.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("token could not be parsed")]
    MalformedToken,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("no signing key matches the token key id")]
    KeyNotFound,

    #[error("no directory record matches the token subject")]
    NotFound,

    #[error("directory record does not hold the required role")]
    RoleMismatch,

    #[error("directory store is unavailable")]
    StoreUnavailable,

    #[error("token issuer is unavailable")]
    IssuerUnavailable,
}

impl ErrorKind {
    /// Stable wire code. Authentication failures start with `auth`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MalformedToken => "auth/malformed-token",
            ErrorKind::SignatureInvalid => "auth/signature-invalid",
            ErrorKind::Expired => "auth/token-expired",
            ErrorKind::KeyNotFound => "auth/key-not-found",
            ErrorKind::NotFound => "directory/not-found",
            ErrorKind::RoleMismatch => "directory/role-mismatch",
            ErrorKind::StoreUnavailable => "infra/store-unavailable",
            ErrorKind::IssuerUnavailable => "infra/issuer-unavailable",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::MalformedToken
            | ErrorKind::SignatureInvalid
            | ErrorKind::Expired
            | ErrorKind::KeyNotFound => ErrorClass::Authentication,
            ErrorKind::NotFound | ErrorKind::RoleMismatch => ErrorClass::Authorization,
            ErrorKind::StoreUnavailable | ErrorKind::IssuerUnavailable => ErrorClass::Infrastructure,
        }
    }

    /// Whether the code carries the `auth` prefix.
    pub fn is_auth_failure(&self) -> bool {
        self.code().starts_with("auth")
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl From<StoreError> for ErrorKind {
    fn from(_: StoreError) -> Self {
        ErrorKind::StoreUnavailable
    }
}

impl From<KeySetError> for ErrorKind {
    fn from(_: KeySetError) -> Self {
        ErrorKind::IssuerUnavailable
    }
}
