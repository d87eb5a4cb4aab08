//! Fink broker service — Binary Entrypoint
//! Boots the Axum HTTP server that exposes the Fink adapter to a host UI.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tom_fink::api::{self, AppState};
use tom_fink::metrics::Metrics;
use tom_fink::{FinkBroker, FinkConfig, InMemoryTargetStore};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FINK_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FINK_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tom_fink=debug,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables FINK_URL / FINK_CONFIG_PATH from .env.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let config = FinkConfig::load_default().context("loading fink config")?;
    tracing::info!(base_url = %config.base_url, "fink broker configured");

    let broker = FinkBroker::new(config).context("building fink http client")?;
    let state = AppState::new(broker, Arc::new(InMemoryTargetStore::new()));

    let metrics = Metrics::init().context("installing prometheus recorder")?;
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
