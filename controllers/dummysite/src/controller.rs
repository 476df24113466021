//! Main controller implementation.
//!
//! Builds the clients, hands the reconciler to the watcher, and runs it next
//! to the metrics server until either stops.

use crate::bundle::BundleSettings;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::server::{self, ServerState};
use crate::watcher::Watcher;
use bundle_client::KubeResourceClient;
use content_fetcher::ContentFetcher;
use crds::DummySite;
use kube::{Api, Client};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for DummySite resources.
#[derive(Debug)]
pub struct Controller {
    watcher: JoinHandle<Result<(), ControllerError>>,
    server: JoinHandle<Result<(), anyhow::Error>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing DummySite Controller");

        let kube_client = Client::try_default().await?;
        let fetcher = ContentFetcher::new(config.fetch_timeout)?;

        let reconciler = Arc::new(Reconciler::new(
            Box::new(KubeResourceClient::new(kube_client.clone())),
            Box::new(fetcher),
            BundleSettings::from(&config),
        ));

        let site_api: Api<DummySite> = match config.namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client, ns),
            None => Api::all(kube_client),
        };

        let is_ready = Arc::new(AtomicBool::new(false));
        let watcher = Watcher::new(
            site_api,
            reconciler,
            config.max_concurrent_reconciles,
            is_ready.clone(),
        );
        let server_state = Arc::new(ServerState { is_ready });

        let watcher = tokio::spawn(watcher.run());
        let server = tokio::spawn(server::start_server(config.metrics_port, server_state));

        Ok(Self { watcher, server })
    }

    /// Runs until a component exits or a shutdown signal arrives.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("DummySite Controller running");

        tokio::select! {
            result = &mut self.watcher => {
                result.map_err(|e| ControllerError::Watch(format!("DummySite watcher panicked: {}", e)))??;
            }
            result = &mut self.server => {
                result.map_err(|e| ControllerError::Watch(format!("HTTP server panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("HTTP server error: {}", e)))?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
            }
        }

        self.watcher.abort();
        self.server.abort();
        Ok(())
    }
}
