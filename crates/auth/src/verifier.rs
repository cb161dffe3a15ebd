//! Bearer token verification against the issuer's published keys.
//!
//! Order of checks:
//! 1. Expiry peek on the unverified payload; an expired token is `Expired`
//!    whatever its header or signature.
//! 2. Header decode (`kid` and an accepted `alg` required).
//! 3. Key lookup in the [`KeySetCache`], with exactly one forced refresh on a
//!    `kid` miss.
//! 4. Signature, algorithm, expiry and optional issuer/audience validation.
//!
//! No subject is ever returned without step 4 succeeding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use thiserror::Error;

use crate::claims::{TokenClaims, VerifiedClaims, peek_expiry};
use crate::error::ErrorKind;
use crate::keyset::KeySetCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Accepted signing algorithms.
    pub algorithms: Vec<Algorithm>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            algorithms: vec![Algorithm::RS256],
            issuer: None,
            audience: None,
            leeway_secs: 0,
        }
    }
}

/// A failed verification.
///
/// Carries the token's claimed expiry when the payload was readable, so
/// clients can tell "refresh your token" apart from other failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct TokenRejection {
    pub kind: ErrorKind,
    pub claimed_expiry: Option<DateTime<Utc>>,
}

impl TokenRejection {
    fn new(kind: ErrorKind, claimed_expiry: Option<DateTime<Utc>>) -> Self {
        Self {
            kind,
            claimed_expiry,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: Arc<KeySetCache>,
    config: VerifierConfig,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeySetCache>, config: VerifierConfig) -> Self {
        Self { keys, config }
    }

    pub fn key_cache(&self) -> &Arc<KeySetCache> {
        &self.keys
    }

    /// Verify `raw` and return its claims.
    ///
    /// `no_cache` forces a key-set refresh for this call; that refresh then
    /// counts as the one retry allowed on a `kid` miss.
    pub async fn verify(&self, raw: &str, no_cache: bool) -> Result<VerifiedClaims, TokenRejection> {
        let result = self.verify_inner(raw, no_cache).await;
        if let Err(rejection) = &result {
            tracing::debug!(
                code = rejection.kind.code(),
                claimed_expiry = ?rejection.claimed_expiry,
                "token rejected"
            );
        }
        result
    }

    async fn verify_inner(&self, raw: &str, no_cache: bool) -> Result<VerifiedClaims, TokenRejection> {
        let claimed_expiry = peek_expiry(raw);
        let reject = |kind: ErrorKind| TokenRejection::new(kind, claimed_expiry);

        let Some(expiry) = claimed_expiry else {
            return Err(reject(ErrorKind::MalformedToken));
        };
        let leeway = i64::try_from(self.config.leeway_secs).unwrap_or(i64::MAX);
        if expiry.timestamp().saturating_add(leeway) < Utc::now().timestamp() {
            return Err(reject(ErrorKind::Expired));
        }

        let header = decode_header(raw).map_err(|_| reject(ErrorKind::MalformedToken))?;
        let kid = header.kid.as_deref().ok_or_else(|| reject(ErrorKind::MalformedToken))?;
        if !self.config.algorithms.contains(&header.alg) {
            return Err(reject(ErrorKind::MalformedToken));
        }

        let keys = self
            .keys
            .get(no_cache)
            .await
            .map_err(|err| reject(err.into()))?;
        let jwk = match keys.find(kid) {
            Some(jwk) => jwk.clone(),
            None if no_cache => return Err(reject(ErrorKind::KeyNotFound)),
            None => {
                tracing::debug!(kid, "unknown key id; refreshing signing keys");
                let refreshed = self.keys.get(true).await.map_err(|err| reject(err.into()))?;
                refreshed
                    .find(kid)
                    .cloned()
                    .ok_or_else(|| reject(ErrorKind::KeyNotFound))?
            }
        };

        let key = DecodingKey::from_jwk(&jwk).map_err(|_| reject(ErrorKind::SignatureInvalid))?;
        let data = decode::<TokenClaims>(raw, &key, &self.validation(header.alg))
            .map_err(|err| reject(map_jwt_error(err.kind())))?;

        let subject = data
            .claims
            .subject()
            .ok_or_else(|| reject(ErrorKind::MalformedToken))?
            .to_string();
        let expiry = DateTime::<Utc>::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| reject(ErrorKind::MalformedToken))?;

        Ok(VerifiedClaims::new(subject, expiry))
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.algorithms = self.config.algorithms.clone();
        validation.leeway = self.config.leeway_secs;
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            // Tokens carrying `aud` are otherwise rejected outright.
            None => validation.validate_aud = false,
        }
        validation
    }
}

fn map_jwt_error(kind: &JwtErrorKind) -> ErrorKind {
    match kind {
        JwtErrorKind::InvalidSignature => ErrorKind::SignatureInvalid,
        JwtErrorKind::ExpiredSignature => ErrorKind::Expired,
        JwtErrorKind::InvalidRsaKey(_) | JwtErrorKind::InvalidEcdsaKey | JwtErrorKind::InvalidKeyFormat => {
            ErrorKind::SignatureInvalid
        }
        _ => ErrorKind::MalformedToken,
    }
}
