//! Desired resource bundle for a DummySite.
//!
//! Every reconcile rebuilds the four members from the site's identity and the
//! freshly fetched page; nothing here looks at live cluster state.

use bundle_client::{BundleKind, BundleObject};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::networking::v1::Ingress;
use serde_json::json;
use std::collections::BTreeMap;

/// Prefix of every bundle member name
pub const RESOURCE_PREFIX: &str = "site-";

/// Value of the `managedBy` label
pub const MANAGED_BY: &str = "dummysite-controller";

/// Label carrying the owning DummySite's name
pub const SITE_NAME_LABEL: &str = "stable.dwk/site-name";

/// Label carrying the owning DummySite's namespace
pub const SITE_NAMESPACE_LABEL: &str = "stable.dwk/site-namespace";

/// ConfigMap key holding the page
pub const CONTENT_KEY: &str = "index.html";

const HTML_VOLUME: &str = "html-volume";
const HTML_MOUNT_PATH: &str = "/usr/share/nginx/html";
const HTTP_PORT: i32 = 80;

/// Cluster-wide knobs for bundle construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSettings {
    /// Domain appended to the site name to form the Ingress host
    pub ingress_domain: String,
    /// Image serving the page
    pub site_image: String,
}

impl From<&crate::config::ControllerConfig> for BundleSettings {
    fn from(config: &crate::config::ControllerConfig) -> Self {
        Self {
            ingress_domain: config.ingress_domain.clone(),
            site_image: config.site_image.clone(),
        }
    }
}

/// Name shared by all members of a site's bundle
pub fn resource_name(site_name: &str) -> String {
    format!("{RESOURCE_PREFIX}{site_name}")
}

/// Ingress host for a site
pub fn site_host(site_name: &str, ingress_domain: &str) -> String {
    format!("{site_name}.{ingress_domain}")
}

/// Public URL reported in the site status
pub fn site_url(site_name: &str, ingress_domain: &str) -> String {
    format!("http://{}", site_host(site_name, ingress_domain))
}

/// Labels attributing a bundle member to its DummySite
pub fn bundle_labels(site_name: &str, namespace: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), resource_name(site_name)),
        ("managedBy".to_string(), MANAGED_BY.to_string()),
        (SITE_NAME_LABEL.to_string(), site_name.to_string()),
        (SITE_NAMESPACE_LABEL.to_string(), namespace.to_string()),
    ])
}

/// The desired bundle of one DummySite, in apply order
#[derive(Debug, Clone)]
pub struct DesiredBundle {
    /// Public URL of the site once published
    pub url: String,
    members: Vec<BundleObject>,
}

impl DesiredBundle {
    /// Build the bundle publishing `content` for DummySite `namespace/site_name`
    pub fn build(
        site_name: &str,
        namespace: &str,
        content: &str,
        settings: &BundleSettings,
    ) -> Result<Self, serde_json::Error> {
        let name = resource_name(site_name);
        let labels = bundle_labels(site_name, namespace);
        let selector = BTreeMap::from([("app".to_string(), name.clone())]);
        let host = site_host(site_name, &settings.ingress_domain);

        let config_map: ConfigMap = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": name, "namespace": namespace, "labels": labels },
            "data": { CONTENT_KEY: content },
        }))?;

        let deployment: Deployment = serde_json::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": name, "namespace": namespace, "labels": labels },
            "spec": {
                "replicas": 1,
                "selector": { "matchLabels": selector },
                "template": {
                    "metadata": { "labels": labels },
                    "spec": {
                        "containers": [{
                            "name": "nginx",
                            "image": settings.site_image,
                            "ports": [{ "containerPort": HTTP_PORT }],
                            "volumeMounts": [{ "name": HTML_VOLUME, "mountPath": HTML_MOUNT_PATH }],
                            "readinessProbe": {
                                "httpGet": { "path": "/", "port": HTTP_PORT },
                                "initialDelaySeconds": 5,
                                "periodSeconds": 10,
                            },
                        }],
                        "volumes": [{ "name": HTML_VOLUME, "configMap": { "name": name } }],
                    },
                },
            },
        }))?;

        let service: Service = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {
                "name": name,
                "namespace": namespace,
                "labels": labels,
                "annotations": { "cloud.google.com/neg": "{\"ingress\": true}" },
            },
            "spec": {
                "type": "ClusterIP",
                "selector": selector,
                "ports": [{ "protocol": "TCP", "port": HTTP_PORT, "targetPort": HTTP_PORT }],
            },
        }))?;

        let ingress: Ingress = serde_json::from_value(json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": { "name": name, "namespace": namespace, "labels": labels },
            "spec": {
                "rules": [{
                    "host": host,
                    "http": {
                        "paths": [{
                            "path": "/",
                            "pathType": "Prefix",
                            "backend": { "service": { "name": name, "port": { "number": HTTP_PORT } } },
                        }],
                    },
                }],
            },
        }))?;

        Ok(Self {
            url: site_url(site_name, &settings.ingress_domain),
            members: vec![
                BundleObject::ConfigMap(config_map),
                BundleObject::Deployment(deployment),
                BundleObject::Service(service),
                BundleObject::Ingress(ingress),
            ],
        })
    }

    /// Members in apply order (content, workload, routing, exposure)
    pub fn members(&self) -> &[BundleObject] {
        &self.members
    }

    /// Kinds and names to delete, in teardown order
    pub fn teardown_plan(site_name: &str) -> Vec<(BundleKind, String)> {
        let name = resource_name(site_name);
        BundleKind::TEARDOWN_ORDER
            .iter()
            .map(|kind| (*kind, name.clone()))
            .collect()
    }
}
