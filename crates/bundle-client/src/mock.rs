//! Mock ResourceClient for unit testing
//!
//! Keeps bundle objects in memory, records every call in order, and can be told
//! to fail a given operation on a given kind. Status and finalizer patches are
//! recorded per DummySite so tests can inspect the last value written.

use crate::client_trait::ResourceClientTrait;
use crate::error::ResourceError;
use crate::models::{BundleKind, BundleObject, CreateOutcome, DeleteOutcome};
use crds::DummySiteStatus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Operation a failure can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// [`ResourceClientTrait::create`]
    Create,
    /// [`ResourceClientTrait::replace`]
    Replace,
    /// [`ResourceClientTrait::delete`]
    Delete,
}

/// A call received by the mock
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs, reason = "variant fields mirror the trait arguments")]
pub enum MockCall {
    /// A bundle member create
    Create { kind: BundleKind, name: String },
    /// A bundle member replace
    Replace { kind: BundleKind, name: String },
    /// A bundle member delete
    Delete { kind: BundleKind, name: String },
    /// A DummySite status write
    PatchStatus { name: String, status: DummySiteStatus },
    /// A DummySite finalizer write
    PatchFinalizers { name: String, finalizers: Vec<String> },
}

type ObjectKey = (BundleKind, String, String);
type SiteKey = (String, String);

/// Mock ResourceClient for testing
#[derive(Debug, Clone, Default)]
pub struct MockResourceClient {
    objects: Arc<Mutex<HashMap<ObjectKey, BundleObject>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    failures: Arc<Mutex<HashMap<(Operation, BundleKind), (u16, String)>>>,
    statuses: Arc<Mutex<HashMap<SiteKey, DummySiteStatus>>>,
    finalizers: Arc<Mutex<HashMap<SiteKey, Vec<String>>>>,
    status_failure: Arc<Mutex<Option<(u16, String)>>>,
    finalizer_failure: Arc<Mutex<Option<(u16, String)>>>,
}

impl MockResourceClient {
    /// Create a new, empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object as if it already existed (for test setup)
    pub fn add_object(&self, namespace: &str, object: BundleObject) {
        let key = (object.kind(), namespace.to_string(), object.name().to_string());
        self.objects.lock().unwrap().insert(key, object);
    }

    /// Make `operation` on `kind` fail with an API error (for test setup)
    pub fn fail_on(&self, operation: Operation, kind: BundleKind, code: u16, message: impl Into<String>) {
        self.failures
            .lock()
            .unwrap()
            .insert((operation, kind), (code, message.into()));
    }

    /// Remove every injected bundle failure
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Make status patches fail (for test setup)
    pub fn fail_status_patch(&self, code: u16, message: impl Into<String>) {
        *self.status_failure.lock().unwrap() = Some((code, message.into()));
    }

    /// Make finalizer patches fail (for test setup)
    pub fn fail_finalizer_patch(&self, code: u16, message: impl Into<String>) {
        *self.finalizer_failure.lock().unwrap() = Some((code, message.into()));
    }

    /// Look up a stored object
    pub fn get_object(&self, namespace: &str, kind: BundleKind, name: &str) -> Option<BundleObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of stored objects across all kinds and namespaces
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget recorded calls, keeping stored objects
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Last status written for a DummySite
    pub fn last_status(&self, namespace: &str, name: &str) -> Option<DummySiteStatus> {
        self.statuses
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Last finalizer list written for a DummySite
    pub fn last_finalizers(&self, namespace: &str, name: &str) -> Option<Vec<String>> {
        self.finalizers
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn injected(&self, operation: Operation, kind: BundleKind) -> Option<ResourceError> {
        self.failures
            .lock()
            .unwrap()
            .get(&(operation, kind))
            .map(|(code, message)| ResourceError::api(*code, "MockFailure", message.clone()))
    }
}

#[async_trait::async_trait]
impl ResourceClientTrait for MockResourceClient {
    async fn create(&self, namespace: &str, object: &BundleObject) -> Result<CreateOutcome, ResourceError> {
        let kind = object.kind();
        let name = object.name().to_string();
        self.record(MockCall::Create { kind, name: name.clone() });

        if let Some(err) = self.injected(Operation::Create, kind) {
            return Err(err);
        }

        let mut objects = self.objects.lock().unwrap();
        let key = (kind, namespace.to_string(), name);
        if objects.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        objects.insert(key, object.clone());
        Ok(CreateOutcome::Created)
    }

    async fn replace(&self, namespace: &str, object: &BundleObject) -> Result<(), ResourceError> {
        let kind = object.kind();
        let name = object.name().to_string();
        self.record(MockCall::Replace { kind, name: name.clone() });

        if let Some(err) = self.injected(Operation::Replace, kind) {
            return Err(err);
        }

        let mut objects = self.objects.lock().unwrap();
        let key = (kind, namespace.to_string(), name.clone());
        match objects.get_mut(&key) {
            Some(existing) => {
                *existing = object.clone();
                Ok(())
            }
            None => Err(ResourceError::api(404, "NotFound", format!("{kind} \"{name}\" not found"))),
        }
    }

    async fn delete(&self, namespace: &str, kind: BundleKind, name: &str) -> Result<DeleteOutcome, ResourceError> {
        self.record(MockCall::Delete { kind, name: name.to_string() });

        if let Some(err) = self.injected(Operation::Delete, kind) {
            return Err(err);
        }

        let removed = self
            .objects
            .lock()
            .unwrap()
            .remove(&(kind, namespace.to_string(), name.to_string()));
        Ok(match removed {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }

    async fn patch_status(&self, namespace: &str, name: &str, status: &DummySiteStatus) -> Result<(), ResourceError> {
        self.record(MockCall::PatchStatus {
            name: name.to_string(),
            status: status.clone(),
        });

        if let Some((code, message)) = self.status_failure.lock().unwrap().clone() {
            return Err(ResourceError::api(code, "MockFailure", message));
        }

        self.statuses
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), status.clone());
        Ok(())
    }

    async fn patch_finalizers(
        &self,
        namespace: &str,
        name: &str,
        finalizers: &[String],
        _resource_version: Option<&str>,
    ) -> Result<(), ResourceError> {
        self.record(MockCall::PatchFinalizers {
            name: name.to_string(),
            finalizers: finalizers.to_vec(),
        });

        if let Some((code, message)) = self.finalizer_failure.lock().unwrap().clone() {
            return Err(ResourceError::api(code, "MockFailure", message));
        }

        self.finalizers
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), finalizers.to_vec());
        Ok(())
    }
}
