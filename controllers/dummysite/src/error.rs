//! Controller-specific error types.
//!
//! Fetch, manifest and apply failures are recorded in the DummySite status
//! and do not escape `reconcile`. Teardown failures leave the finalizer in
//! place; finalizer and status failures are returned to the caller.

use bundle_client::{BundleKind, ResourceError};
use content_fetcher::FetchError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the DummySite Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client initialisation or watch error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Site content could not be retrieved
    #[error("Error fetching URL: {0}")]
    Fetch(#[from] FetchError),

    /// A bundle member could not be created or replaced
    #[error("Error applying {kind} {name}: {source}")]
    Apply {
        /// Kind of the member
        kind: BundleKind,
        /// Name of the member
        name: String,
        /// API server or client failure
        #[source]
        source: ResourceError,
    },

    /// A bundle manifest could not be assembled
    #[error("Error building site resources: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A bundle member could not be deleted
    #[error("Error deleting {kind} {name}: {source}")]
    Teardown {
        /// Kind of the member
        kind: BundleKind,
        /// Name of the member
        name: String,
        /// API server or client failure
        #[source]
        source: ResourceError,
    },

    /// Adding or removing the controller finalizer failed
    #[error("Finalizer patch failed: {0}")]
    Finalizer(#[source] ResourceError),

    /// Writing the status subresource failed
    #[error("Status update failed: {0}")]
    Status(#[source] ResourceError),

    /// The DummySite object is missing required metadata
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
