//! Bundle object model
//!
//! The four resource kinds a `DummySite` owns, wrapped in one enum so callers
//! can walk a bundle in order without caring about the concrete type.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::networking::v1::Ingress;
use std::fmt;

/// Kind of a bundle member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BundleKind {
    /// Holds the fetched page
    ConfigMap,
    /// Serves the page
    Deployment,
    /// Routes cluster traffic to the workload
    Service,
    /// Exposes the service outside the cluster
    Ingress,
}

impl BundleKind {
    /// Apply order: content, workload, routing, exposure
    pub const APPLY_ORDER: [BundleKind; 4] = [
        BundleKind::ConfigMap,
        BundleKind::Deployment,
        BundleKind::Service,
        BundleKind::Ingress,
    ];

    /// Teardown order, the reverse of [`BundleKind::APPLY_ORDER`]
    pub const TEARDOWN_ORDER: [BundleKind; 4] = [
        BundleKind::Ingress,
        BundleKind::Service,
        BundleKind::Deployment,
        BundleKind::ConfigMap,
    ];

    /// Kubernetes kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleKind::ConfigMap => "ConfigMap",
            BundleKind::Deployment => "Deployment",
            BundleKind::Service => "Service",
            BundleKind::Ingress => "Ingress",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed bundle member
#[derive(Debug, Clone, PartialEq)]
pub enum BundleObject {
    /// Page content
    ConfigMap(ConfigMap),
    /// nginx workload mounting the content
    Deployment(Deployment),
    /// ClusterIP service in front of the workload
    Service(Service),
    /// Host rule routing to the service
    Ingress(Ingress),
}

impl BundleObject {
    /// Kind of the wrapped object
    pub fn kind(&self) -> BundleKind {
        match self {
            BundleObject::ConfigMap(_) => BundleKind::ConfigMap,
            BundleObject::Deployment(_) => BundleKind::Deployment,
            BundleObject::Service(_) => BundleKind::Service,
            BundleObject::Ingress(_) => BundleKind::Ingress,
        }
    }

    /// `metadata.name` of the wrapped object (empty if unset)
    pub fn name(&self) -> &str {
        let name = match self {
            BundleObject::ConfigMap(o) => o.metadata.name.as_deref(),
            BundleObject::Deployment(o) => o.metadata.name.as_deref(),
            BundleObject::Service(o) => o.metadata.name.as_deref(),
            BundleObject::Ingress(o) => o.metadata.name.as_deref(),
        };
        name.unwrap_or_default()
    }

    /// `metadata.labels` of the wrapped object
    pub fn labels(&self) -> Option<&std::collections::BTreeMap<String, String>> {
        match self {
            BundleObject::ConfigMap(o) => o.metadata.labels.as_ref(),
            BundleObject::Deployment(o) => o.metadata.labels.as_ref(),
            BundleObject::Service(o) => o.metadata.labels.as_ref(),
            BundleObject::Ingress(o) => o.metadata.labels.as_ref(),
        }
    }
}

/// Result of a create call that reached the API server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The object did not exist and was created
    Created,
    /// An object with the same name already exists
    AlreadyExists,
}

/// Result of a delete call that reached the API server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The object existed and deletion was accepted
    Deleted,
    /// There was nothing to delete
    NotFound,
}
