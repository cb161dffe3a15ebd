//! Fixtures for exercising token verification end to end.
//!
//! Available to this crate's unit tests and, behind the `test-support`
//! feature, to downstream test suites. Not for production use.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use crate::keyset::{KeySetError, KeySetFetcher};

/// Key id the test issuer publishes.
pub const ISSUER_KID: &str = "gatekeep-test-1";

/// RSA-2048 private key of the test issuer (PKCS#1 PEM).
pub const ISSUER_PRIVATE_PEM: &str = include_str!("../tests/fixtures/issuer_rsa.pem");

/// Base64url modulus of [`ISSUER_PRIVATE_PEM`]; the exponent is 65537.
pub const ISSUER_MODULUS: &str = include_str!("../tests/fixtures/issuer_rsa.n");

/// A second RSA key the issuer never publishes.
pub const ROGUE_PRIVATE_PEM: &str = include_str!("../tests/fixtures/rogue_rsa.pem");

/// JWKS document for the test issuer, as served over HTTP.
pub fn issuer_jwks_json(kid: &str) -> serde_json::Value {
    serde_json::json!({
        "keys": [{
            "kty": "RSA",
            "kid": kid,
            "alg": "RS256",
            "use": "sig",
            "n": ISSUER_MODULUS,
            "e": "AQAB"
        }]
    })
}

pub fn issuer_jwks(kid: &str) -> JwkSet {
    serde_json::from_value(issuer_jwks_json(kid)).expect("fixture JWKS is valid")
}

/// Sign arbitrary claims with `pem` under `kid` (RS256).
pub fn sign(pem: &str, kid: &str, claims: &serde_json::Value) -> String {
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture PEM is valid");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &key).expect("fixture claims encode")
}

/// Issuer-signed token for `email`, expiring `expires_in_secs` from now
/// (negative for an already-expired token).
pub fn mint(email: &str, expires_in_secs: i64) -> String {
    let now = Utc::now().timestamp();
    sign(
        ISSUER_PRIVATE_PEM,
        ISSUER_KID,
        &serde_json::json!({
            "email": email,
            "sub": format!("uid-{email}"),
            "iat": now,
            "exp": now + expires_in_secs,
        }),
    )
}

/// In-process fetcher serving a fixed key set, counting fetches.
#[derive(Debug)]
pub struct StaticFetcher {
    keys: std::sync::Mutex<Result<JwkSet, KeySetError>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(keys: JwkSet) -> Arc<Self> {
        Arc::new(Self {
            keys: std::sync::Mutex::new(Ok(keys)),
            calls: AtomicUsize::new(0),
        })
    }

    /// Replace what subsequent fetches return (key rotation, outage).
    pub fn set(&self, keys: Result<JwkSet, KeySetError>) {
        *self.keys.lock().expect("fixture lock") = keys;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetFetcher for StaticFetcher {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().expect("fixture lock").clone()
    }
}
