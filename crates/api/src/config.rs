//! Process configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use gatekeep_auth::{AliasDomains, VerifierConfig};
use gatekeep_core::DomainError;
use gatekeep_infra::GOOGLE_SECURETOKEN_JWKS_URL;

pub const DEFAULT_ALIAS_DOMAINS: &str = "iitbhu.ac.in=itbhu.ac.in";
pub const DEFAULT_JWKS_TTL_SECS: u64 = 3600;
pub const DEFAULT_DIRECTORY_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    NotANumber { key: &'static str, value: String },

    #[error("ALIAS_DOMAINS: {0}")]
    AliasDomains(#[from] DomainError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwks_url: String,
    pub jwks_ttl: Duration,
    pub directory_cache_ttl: Duration,
    pub verifier: VerifierConfig,
    pub aliases: AliasDomains,
    /// JSON document the in-memory directory is seeded from.
    pub directory_seed: Option<PathBuf>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwks_url = get("JWKS_URL").unwrap_or_else(|| GOOGLE_SECURETOKEN_JWKS_URL.to_string());
        let jwks_ttl = Duration::from_secs(number(
            "JWKS_TTL_SECS",
            get("JWKS_TTL_SECS"),
            DEFAULT_JWKS_TTL_SECS,
        )?);
        let directory_cache_ttl = Duration::from_secs(number(
            "DIRECTORY_CACHE_TTL_SECS",
            get("DIRECTORY_CACHE_TTL_SECS"),
            DEFAULT_DIRECTORY_CACHE_TTL_SECS,
        )?);
        let port = number("PORT", get("PORT"), DEFAULT_PORT)?;

        let verifier = VerifierConfig {
            issuer: get("TOKEN_ISSUER"),
            audience: get("TOKEN_AUDIENCE"),
            ..VerifierConfig::default()
        };

        let aliases = AliasDomains::parse(
            get("ALIAS_DOMAINS")
                .as_deref()
                .unwrap_or(DEFAULT_ALIAS_DOMAINS),
        )?;

        Ok(Self {
            jwks_url,
            jwks_ttl,
            directory_cache_ttl,
            verifier,
            aliases,
            directory_seed: get("DIRECTORY_SEED_PATH").map(PathBuf::from),
            port,
        })
    }
}

fn number<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::NotANumber { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.jwks_url, GOOGLE_SECURETOKEN_JWKS_URL);
        assert_eq!(config.jwks_ttl, Duration::from_secs(3600));
        assert_eq!(config.port, 8080);
        assert_eq!(config.directory_seed, None);
        assert_eq!(config.verifier, VerifierConfig::default());
        assert_eq!(
            config.aliases.pairs(),
            &[("iitbhu.ac.in".to_string(), "itbhu.ac.in".to_string())]
        );
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("JWKS_URL", "http://127.0.0.1:9000/jwks"),
            ("JWKS_TTL_SECS", "600"),
            ("DIRECTORY_CACHE_TTL_SECS", "5"),
            ("TOKEN_ISSUER", "https://issuer.example"),
            ("TOKEN_AUDIENCE", "placement-portal"),
            ("ALIAS_DOMAINS", "a.edu=b.edu, c.edu=d.edu"),
            ("DIRECTORY_SEED_PATH", "/etc/gatekeep/directory.json"),
            ("PORT", "9090"),
        ]))
        .unwrap();

        assert_eq!(config.jwks_url, "http://127.0.0.1:9000/jwks");
        assert_eq!(config.jwks_ttl, Duration::from_secs(600));
        assert_eq!(config.directory_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.verifier.issuer.as_deref(), Some("https://issuer.example"));
        assert_eq!(config.verifier.audience.as_deref(), Some("placement-portal"));
        assert_eq!(config.aliases.pairs().len(), 2);
        assert_eq!(
            config.directory_seed.as_deref(),
            Some(std::path::Path::new("/etc/gatekeep/directory.json"))
        );
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("PORT", "  "), ("TOKEN_AUDIENCE", "")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.verifier.audience, None);
    }

    #[test]
    fn rejects_junk() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("JWKS_TTL_SECS", "an hour")])),
            Err(ConfigError::NotANumber { key: "JWKS_TTL_SECS", .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("ALIAS_DOMAINS", "no-separator")])),
            Err(ConfigError::AliasDomains(_))
        ));
    }
}
