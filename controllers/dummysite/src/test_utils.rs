//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test data and setting up test scenarios.

#[cfg(test)]
use crate::bundle::BundleSettings;
#[cfg(test)]
use crate::reconciler::{Reconciler, FINALIZER};
#[cfg(test)]
use bundle_client::MockResourceClient;
#[cfg(test)]
use content_fetcher::MockContentFetcher;
#[cfg(test)]
use crds::{DummySite, DummySiteSpec};
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Namespace of every test site
#[cfg(test)]
pub const TEST_NAMESPACE: &str = "demo";

/// Source URL of the default test site
#[cfg(test)]
pub const TEST_URL: &str = "http://example.com";

/// Helper to create a test DummySite CRD
#[cfg(test)]
pub fn create_test_site(name: &str, website_url: &str, finalizers: &[&str]) -> DummySite {
    let mut site = DummySite::new(
        name,
        DummySiteSpec {
            website_url: website_url.to_string(),
        },
    );
    site.metadata = ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(TEST_NAMESPACE.to_string()),
        generation: Some(1),
        resource_version: Some("100".to_string()),
        finalizers: if finalizers.is_empty() {
            None
        } else {
            Some(finalizers.iter().map(|f| (*f).to_string()).collect())
        },
        ..Default::default()
    };
    site
}

/// Helper to create a DummySite that already carries the controller finalizer
#[cfg(test)]
pub fn create_finalized_site(name: &str, website_url: &str) -> DummySite {
    create_test_site(name, website_url, &[FINALIZER])
}

/// Marks `site` as deleted by the API server
#[cfg(test)]
pub fn mark_deleting(mut site: DummySite) -> DummySite {
    site.metadata.deletion_timestamp =
        Some(serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).unwrap());
    site
}

/// Bundle settings used by every test reconciler
#[cfg(test)]
pub fn test_settings() -> BundleSettings {
    BundleSettings {
        ingress_domain: "dummysite.io".to_string(),
        site_image: "nginx:alpine".to_string(),
    }
}

/// Helper to create a reconciler backed by the given mocks
#[cfg(test)]
pub fn create_test_reconciler(resources: &MockResourceClient, fetcher: &MockContentFetcher) -> Reconciler {
    Reconciler::new(
        Box::new(resources.clone()),
        Box::new(fetcher.clone()),
        test_settings(),
    )
}
