//! HTTP client for the issuer's JWKS endpoint.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;

use gatekeep_auth::{KeySetError, KeySetFetcher};

/// Google's securetoken issuer (Firebase ID tokens).
pub const GOOGLE_SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpJwksFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpJwksFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(client, url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySetFetcher for HttpJwksFetcher {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| KeySetError::unavailable(err.to_string()))?;

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|err| KeySetError::unavailable(format!("invalid JWKS document: {err}")))?;

        tracing::debug!(url = %self.url, keys = keys.keys.len(), "fetched JWKS");
        Ok(keys)
    }
}
