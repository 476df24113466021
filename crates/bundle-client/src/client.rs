//! Kubernetes-backed bundle client
//!
//! Thin typed layer over `kube::Api`. Replacement reads the live object first
//! so the write carries its `resourceVersion` and the API server rejects it
//! if someone else changed the object in between.

use crate::client_trait::ResourceClientTrait;
use crate::error::ResourceError;
use crate::models::{BundleKind, BundleObject, CreateOutcome, DeleteOutcome};
use crds::{DummySite, DummySiteStatus};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::error::ErrorResponse;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt::{self, Debug};
use tracing::debug;

/// Bundle client talking to a live API server
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl Debug for KubeResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeResourceClient").finish_non_exhaustive()
    }
}

impl KubeResourceClient {
    /// Create a new client from an initialised kube `Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn create_typed<K>(&self, namespace: &str, object: &K) -> Result<CreateOutcome, ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned,
        K::DynamicType: Default,
    {
        match self.api::<K>(namespace).create(&PostParams::default(), object).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(kube::Error::Api(ErrorResponse { code: 409, .. })) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces `object`, carrying over the fields the API server owns
    async fn replace_typed<K, F>(&self, namespace: &str, object: &K, carry_over: F) -> Result<(), ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned,
        K::DynamicType: Default,
        F: FnOnce(&K, &mut K),
    {
        let api = self.api::<K>(namespace);
        let name = object.meta().name.clone().unwrap_or_default();

        let live = api.get(&name).await?;
        let mut desired = object.clone();
        desired.meta_mut().resource_version = live.meta().resource_version.clone();
        carry_over(&live, &mut desired);

        api.replace(&name, &PostParams::default(), &desired).await?;
        Ok(())
    }

    async fn delete_typed<K>(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, ResourceError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + DeserializeOwned,
        K::DynamicType: Default,
    {
        match self.api::<K>(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// `spec.clusterIP` is immutable, so a replacement must repeat the allocated one.
fn carry_over_cluster_ip(live: &Service, desired: &mut Service) {
    if let (Some(live_spec), Some(desired_spec)) = (live.spec.as_ref(), desired.spec.as_mut()) {
        if desired_spec.cluster_ip.is_none() {
            desired_spec.cluster_ip = live_spec.cluster_ip.clone();
            desired_spec.cluster_ips = live_spec.cluster_ips.clone();
        }
    }
}

#[async_trait::async_trait]
impl ResourceClientTrait for KubeResourceClient {
    async fn create(&self, namespace: &str, object: &BundleObject) -> Result<CreateOutcome, ResourceError> {
        debug!("Creating {} {}/{}", object.kind(), namespace, object.name());
        match object {
            BundleObject::ConfigMap(o) => self.create_typed(namespace, o).await,
            BundleObject::Deployment(o) => self.create_typed(namespace, o).await,
            BundleObject::Service(o) => self.create_typed(namespace, o).await,
            BundleObject::Ingress(o) => self.create_typed(namespace, o).await,
        }
    }

    async fn replace(&self, namespace: &str, object: &BundleObject) -> Result<(), ResourceError> {
        debug!("Replacing {} {}/{}", object.kind(), namespace, object.name());
        match object {
            BundleObject::ConfigMap(o) => self.replace_typed(namespace, o, |_, _| {}).await,
            BundleObject::Deployment(o) => self.replace_typed(namespace, o, |_, _| {}).await,
            BundleObject::Service(o) => self.replace_typed(namespace, o, carry_over_cluster_ip).await,
            BundleObject::Ingress(o) => self.replace_typed(namespace, o, |_, _| {}).await,
        }
    }

    async fn delete(&self, namespace: &str, kind: BundleKind, name: &str) -> Result<DeleteOutcome, ResourceError> {
        debug!("Deleting {} {}/{}", kind, namespace, name);
        match kind {
            BundleKind::ConfigMap => self.delete_typed::<ConfigMap>(namespace, name).await,
            BundleKind::Deployment => self.delete_typed::<Deployment>(namespace, name).await,
            BundleKind::Service => self.delete_typed::<Service>(namespace, name).await,
            BundleKind::Ingress => self.delete_typed::<Ingress>(namespace, name).await,
        }
    }

    async fn patch_status(&self, namespace: &str, name: &str, status: &DummySiteStatus) -> Result<(), ResourceError> {
        let patch = json!({ "status": status });
        self.api::<DummySite>(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_finalizers(
        &self,
        namespace: &str,
        name: &str,
        finalizers: &[String],
        resource_version: Option<&str>,
    ) -> Result<(), ResourceError> {
        // A merge patch replaces the whole list; resourceVersion acts as a precondition
        let mut metadata = json!({ "finalizers": finalizers });
        if let Some(rv) = resource_version {
            metadata["resourceVersion"] = json!(rv);
        }
        let patch = json!({ "metadata": metadata });

        self.api::<DummySite>(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
