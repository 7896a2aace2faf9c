use std::fs;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use protchain_guard_core::{Guard, InMemoryDigestStore, IntegrityChecker, TokenVerifier};

mod app;
mod config;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("JWT_SECRET must be set")?;

    let store = match &config.reference_digests {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            InMemoryDigestStore::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => InMemoryDigestStore::new(),
    };
    info!(references = store.len(), "loaded reference digests");

    let guard = Guard::new(TokenVerifier::new(config.jwt_secret()), IntegrityChecker::new(Arc::new(store)));
    let app = app::router(app::AppState::new(guard));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!("guard-server listening on {}", config.bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}
