//! DummySite Custom Resource Definition
//!
//! A `DummySite` asks the controller to publish a snapshot of an external web
//! page inside the cluster.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// DummySiteSpec defines the desired state of a published site
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "stable.dwk",
    version = "v1",
    kind = "DummySite",
    plural = "dummysites",
    shortname = "ds",
    namespaced,
    status = "DummySiteStatus",
    printcolumn = r#"{"name":"Source", "type":"string", "jsonPath":".spec.website_url"}"#,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"URL", "type":"string", "jsonPath":".status.url"}"#
)]
pub struct DummySiteSpec {
    /// URL of the page whose content is published
    ///
    /// Stored as `website_url` so manifests written for earlier releases keep working.
    #[serde(rename = "website_url", alias = "websiteUrl", alias = "sourceURL")]
    pub website_url: String,
}

/// DummySiteStatus defines the observed state of a published site
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DummySiteStatus {
    /// Current phase of the site
    pub phase: SitePhase,

    /// Human-readable description of the last reconciliation
    #[serde(default)]
    pub message: String,

    /// Public URL of the site (empty unless deployed)
    #[serde(default)]
    pub url: String,

    /// Generation of the spec this status was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl DummySiteStatus {
    /// Status for a site whose bundle was applied completely
    pub fn deployed(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            phase: SitePhase::Deployed,
            message: message.into(),
            url: url.into(),
            observed_generation: None,
        }
    }

    /// Status for a site that could not be published
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: SitePhase::Failed,
            message: message.into(),
            url: String::new(),
            observed_generation: None,
        }
    }

    /// Stamps the generation the status was derived from
    #[must_use]
    pub fn with_observed_generation(mut self, generation: Option<i64>) -> Self {
        self.observed_generation = generation;
        self
    }
}

/// Site phase
///
/// Serializes as PascalCase ("Deployed", "Failed", etc.) and also accepts
/// lowercase on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum SitePhase {
    /// Not reconciled yet
    #[default]
    #[serde(alias = "pending")]
    Pending,

    /// All bundle members exist
    #[serde(alias = "deployed")]
    Deployed,

    /// Fetching content or applying the bundle failed
    #[serde(alias = "failed")]
    Failed,
}

impl DummySite {
    /// Finalizers currently set on the object
    pub fn finalizers(&self) -> &[String] {
        self.metadata.finalizers.as_deref().unwrap_or_default()
    }

    /// Whether `finalizer` is present
    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers().iter().any(|f| f == finalizer)
    }

    /// Whether the API server has recorded a deletion request
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
}
