//! DummySite Bundle Client
//!
//! Typed create/replace/delete access to the resources a `DummySite` owns
//! (ConfigMap, Deployment, Service, Ingress), plus status and finalizer
//! patches on the `DummySite` itself.
//!
//! Create and delete report "already exists" and "not found" as outcomes
//! rather than errors, so callers can drive upsert and idempotent teardown
//! without inspecting HTTP status codes.
//!
//! # Example
//!
//! ```no_run
//! use bundle_client::{BundleObject, CreateOutcome, KubeResourceClient, ResourceClientTrait};
//! use k8s_openapi::api::core::v1::ConfigMap;
//!
//! # async fn example(config_map: ConfigMap) -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeResourceClient::new(kube::Client::try_default().await?);
//! let object = BundleObject::ConfigMap(config_map);
//! if client.create("demo", &object).await? == CreateOutcome::AlreadyExists {
//!     client.replace("demo", &object).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
#[cfg(test)]
mod client_test;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod client_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeResourceClient;
pub use client_trait::ResourceClientTrait;
pub use error::ResourceError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockResourceClient, Operation};
