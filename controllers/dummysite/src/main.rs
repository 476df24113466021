//! DummySite Controller
//!
//! Publishes snapshots of external web pages inside the cluster. For every
//! `DummySite` the controller fetches the page at `website_url` and serves it
//! through a ConfigMap, Deployment, Service and Ingress named `site-<name>`.
//! A finalizer keeps the `DummySite` around until that bundle is removed.

mod bundle;
mod config;
mod controller;
mod error;
mod metrics;
mod reconciler;
mod server;
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    // kube and reqwest both use rustls; pin the process-wide provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("Starting DummySite Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Fetch timeout: {}s", config.fetch_timeout.as_secs());
    info!("  Ingress domain: {}", config.ingress_domain);
    info!("  Site image: {}", config.site_image);
    info!("  Max concurrent reconciles: {}", config.max_concurrent_reconciles);

    metrics::register_metrics()
        .map_err(|e| ControllerError::InvalidConfig(format!("Failed to register metrics: {}", e)))?;

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
