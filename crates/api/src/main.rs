use std::sync::Arc;

use anyhow::Context;

use gatekeep_api::app::{self, services};
use gatekeep_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gatekeep_observability::init();

    let config = Config::from_env().context("invalid configuration")?;

    let seed = match &config.directory_seed {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading directory seed {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing directory seed {}", path.display()))?
        }
        None => {
            tracing::warn!("DIRECTORY_SEED_PATH not set; starting with an empty directory");
            services::DirectorySeed::default()
        }
    };

    let services = Arc::new(services::build_services(&config, seed)?);

    // Warm the key cache; verification retries on demand if the issuer is down.
    if let Err(err) = services.keys.get(false).await {
        tracing::warn!(error = %err, url = %config.jwks_url, "initial signing key fetch failed");
    }

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind 0.0.0.0:{}", config.port))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
