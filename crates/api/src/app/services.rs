//! Component wiring shared by all routes.

use std::sync::Arc;

use serde::Deserialize;

use gatekeep_auth::{IdentityResolver, KeySetCache, KeySetFetcher, TokenVerifier};
use gatekeep_directory::{
    DirectoryStore, Group, RecruiterRecord, StoreError, StudentRecord, TrustInvalidator,
};
use gatekeep_infra::{CachedDirectoryStore, HttpJwksFetcher, InMemoryDirectoryStore};

use crate::config::Config;

/// Long-lived components, shared by reference across requests.
pub struct AppServices {
    pub keys: Arc<KeySetCache>,
    pub verifier: TokenVerifier,
    pub resolver: IdentityResolver,
    pub store: Arc<dyn DirectoryStore>,
    pub trust: TrustInvalidator,
}

impl AppServices {
    pub fn new(
        fetcher: Arc<dyn KeySetFetcher>,
        store: Arc<dyn DirectoryStore>,
        config: &Config,
    ) -> Self {
        let keys = Arc::new(KeySetCache::new(fetcher, config.jwks_ttl));
        let verifier = TokenVerifier::new(keys.clone(), config.verifier.clone());
        let resolver = IdentityResolver::new(store.clone(), config.aliases.clone());

        Self {
            keys,
            verifier,
            resolver,
            store,
            trust: TrustInvalidator::default(),
        }
    }
}

/// Initial directory contents, as loaded from `DIRECTORY_SEED_PATH`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DirectorySeed {
    pub groups: Vec<Group>,
    pub students: Vec<StudentRecord>,
    pub recruiters: Vec<RecruiterRecord>,
}

pub fn seed_directory(store: &InMemoryDirectoryStore, seed: DirectorySeed) -> Result<(), StoreError> {
    let (groups, students, recruiters) = (seed.groups.len(), seed.students.len(), seed.recruiters.len());

    for group in seed.groups {
        store.insert_group(group)?;
    }
    for student in seed.students {
        store.insert_student(student)?;
    }
    for recruiter in seed.recruiters {
        store.insert_recruiter(recruiter)?;
    }

    tracing::info!(groups, students, recruiters, "directory seeded");
    Ok(())
}

/// Production wiring: JWKS over HTTP, seeded in-memory directory behind the
/// read cache.
pub fn build_services(config: &Config, seed: DirectorySeed) -> Result<AppServices, StoreError> {
    let directory = InMemoryDirectoryStore::new();
    seed_directory(&directory, seed)?;

    let store: Arc<dyn DirectoryStore> =
        Arc::new(CachedDirectoryStore::new(directory, config.directory_cache_ttl));
    let fetcher: Arc<dyn KeySetFetcher> = Arc::new(HttpJwksFetcher::new(config.jwks_url.clone()));

    Ok(AppServices::new(fetcher, store, config))
}
