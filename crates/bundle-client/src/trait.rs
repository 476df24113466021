//! ResourceClient trait for mocking
//!
//! `KubeResourceClient` implements this trait against a live API server;
//! tests use `MockResourceClient` (feature `test-util`).

use crate::error::ResourceError;
use crate::models::{BundleKind, BundleObject, CreateOutcome, DeleteOutcome};
use crds::DummySiteStatus;

/// Trait for Kubernetes operations the DummySite reconciler performs
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ResourceClientTrait: Send + Sync {
    /// Create `object` in `namespace`
    ///
    /// A name collision is reported as `Ok(CreateOutcome::AlreadyExists)`.
    async fn create(&self, namespace: &str, object: &BundleObject) -> Result<CreateOutcome, ResourceError>;

    /// Replace the existing object with the same name as `object`
    async fn replace(&self, namespace: &str, object: &BundleObject) -> Result<(), ResourceError>;

    /// Delete `name` of `kind` in `namespace`
    ///
    /// A missing object is reported as `Ok(DeleteOutcome::NotFound)`.
    async fn delete(&self, namespace: &str, kind: BundleKind, name: &str) -> Result<DeleteOutcome, ResourceError>;

    /// Merge-patch the status subresource of DummySite `name`
    async fn patch_status(&self, namespace: &str, name: &str, status: &DummySiteStatus) -> Result<(), ResourceError>;

    /// Set the complete finalizer list of DummySite `name`
    ///
    /// When `resource_version` is given the patch only applies to that
    /// version of the object.
    async fn patch_finalizers(
        &self,
        namespace: &str,
        name: &str,
        finalizers: &[String],
        resource_version: Option<&str>,
    ) -> Result<(), ResourceError>;
}
