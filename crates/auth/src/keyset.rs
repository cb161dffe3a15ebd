//! Issuer signing keys with TTL caching and coalesced refresh.
//!
//! # Key invariants
//! - A [`SigningKeySet`] is never empty; an empty issuer response is a fetch
//!   failure.
//! - Sets are replaced wholesale (`Arc` swap). Readers holding an `Arc` keep a
//!   consistent snapshot across a refresh.
//! - At most one fetch is in flight. Callers that queue behind a fetch share
//!   its outcome instead of issuing their own.
//! - An invalidation is only satisfied by a fetch that started after it.
//! - A failed refresh serves the cached set while it is within TTL (even
//!   after [`KeySetCache::invalidate`]); past TTL the failure propagates.
//!
//! # Concurrency model
//! Cache state sits behind a `std::sync::RwLock` that is only held for
//! snapshot/swap and never across an `.await`. Fetches are serialized by a
//! `tokio::sync::Mutex` gate plus an attempt counter.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeySetError {
    #[error("issuer key endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("issuer published an empty key set")]
    Empty,
}

impl KeySetError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Source of the issuer's published keys (normally an HTTP JWKS endpoint).
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// An immutable, non-empty snapshot of the issuer's keys.
#[derive(Debug, Clone)]
pub struct SigningKeySet {
    keys: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

impl SigningKeySet {
    pub fn new(keys: JwkSet, fetched_at: Instant, ttl: Duration) -> Result<Self, KeySetError> {
        if keys.keys.is_empty() {
            return Err(KeySetError::Empty);
        }
        Ok(Self {
            keys,
            fetched_at,
            ttl,
        })
    }

    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .keys
            .iter()
            .find(|key| key.common.key_id.as_deref() == Some(kid))
    }

    /// Key ids in issuer order.
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys
            .keys
            .iter()
            .filter_map(|key| key.common.key_id.as_deref())
    }

    pub fn len(&self) -> usize {
        self.keys.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.keys.is_empty()
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    pub fn expires_at(&self) -> Instant {
        self.fetched_at + self.ttl
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Debug, Default)]
struct CacheState {
    current: Option<Arc<SigningKeySet>>,
    /// Completed fetch attempts, successful or not.
    attempts: u64,
    last_error: Option<KeySetError>,
    invalidated: bool,
    /// Bumped by every `invalidate`; a fetch only clears `invalidated` when
    /// no invalidation arrived while it was in flight.
    invalidations: u64,
}

impl CacheState {
    fn fresh(&self, now: Instant) -> Option<Arc<SigningKeySet>> {
        if self.invalidated {
            return None;
        }
        self.within_ttl(now)
    }

    fn within_ttl(&self, now: Instant) -> Option<Arc<SigningKeySet>> {
        self.current
            .as_ref()
            .filter(|set| !set.is_expired(now))
            .cloned()
    }

    /// Outcome of the most recent attempt, as seen by a caller that waited on it.
    fn last_outcome(&self, now: Instant) -> Result<Arc<SigningKeySet>, KeySetError> {
        match &self.last_error {
            None => self
                .current
                .clone()
                .ok_or_else(|| KeySetError::unavailable("no key set cached")),
            Some(err) => self.within_ttl(now).ok_or_else(|| err.clone()),
        }
    }
}

/// Process-wide cache of the issuer's signing keys.
///
/// Constructed once at startup and shared as `Arc<KeySetCache>`.
pub struct KeySetCache {
    fetcher: Arc<dyn KeySetFetcher>,
    ttl: Duration,
    state: RwLock<CacheState>,
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl KeySetCache {
    pub fn new(fetcher: Arc<dyn KeySetFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            state: RwLock::new(CacheState::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached set, if any, regardless of freshness.
    pub fn snapshot(&self) -> Option<Arc<SigningKeySet>> {
        self.read_state().current.clone()
    }

    /// Current keys.
    ///
    /// With `force_refresh == false` a fresh cached set is returned without
    /// touching the network. Otherwise (or when the set is missing, expired or
    /// invalidated) the issuer is asked for keys.
    pub async fn get(&self, force_refresh: bool) -> Result<Arc<SigningKeySet>, KeySetError> {
        let observed = {
            let state = self.read_state();
            if !force_refresh {
                if let Some(set) = state.fresh(Instant::now()) {
                    return Ok(set);
                }
            }
            state.attempts
        };

        let _gate = self.refresh_gate.lock().await;

        {
            let state = self.read_state();
            if state.attempts != observed {
                // An attempt finished while we queued; share its outcome.
                return state.last_outcome(Instant::now());
            }
        }

        self.refresh().await
    }

    /// Force the next `get` to go to the issuer.
    ///
    /// The cached set stays available as a fallback within its TTL.
    pub fn invalidate(&self) {
        let mut state = self.write_state();
        state.invalidated = true;
        state.invalidations += 1;
        tracing::info!(
            cached = state.current.is_some(),
            "signing key cache invalidated"
        );
    }

    /// Must be called with the refresh gate held.
    async fn refresh(&self) -> Result<Arc<SigningKeySet>, KeySetError> {
        let generation = self.read_state().invalidations;
        let fetched = self.fetcher.fetch().await;
        let now = Instant::now();
        let result = fetched.and_then(|keys| SigningKeySet::new(keys, now, self.ttl));

        let mut state = self.write_state();
        state.attempts += 1;

        match result {
            Ok(set) => {
                let set = Arc::new(set);
                tracing::info!(
                    keys = set.len(),
                    ttl_secs = self.ttl.as_secs(),
                    "signing key set refreshed"
                );
                state.current = Some(Arc::clone(&set));
                if state.invalidations == generation {
                    state.invalidated = false;
                }
                state.last_error = None;
                Ok(set)
            }
            Err(err) => {
                state.last_error = Some(err.clone());
                match state.within_ttl(now) {
                    Some(stale) => {
                        tracing::warn!(error = %err, "key set refresh failed; serving cached keys");
                        Ok(stale)
                    }
                    None => {
                        tracing::warn!(error = %err, "key set refresh failed and no usable keys are cached");
                        Err(err)
                    }
                }
            }
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
