//! Reconciliation logic for DummySite CRDs.
//!
//! Every call re-derives what to do from the object it is handed: add the
//! finalizer, publish the bundle, or tear it down and release the finalizer.
//! No state is carried between calls, so duplicated or reordered events are
//! harmless.

use crate::bundle::{BundleSettings, DesiredBundle};
use crate::error::ControllerError;
use crate::metrics;
use bundle_client::{BundleObject, CreateOutcome, DeleteOutcome, ResourceClientTrait};
use content_fetcher::ContentFetcherTrait;
use crds::{DummySite, DummySiteStatus};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Finalizer guarding bundle teardown
pub const FINALIZER: &str = "stable.dwk/finalizer";

/// Status message of a fully published site
pub const DEPLOYED_MESSAGE: &str = "All resources created successfully.";

/// Lifecycle position of a DummySite, derived from its metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteState {
    /// Not deleting and the finalizer is missing
    New,
    /// Not deleting and the finalizer is present
    Reconciling,
    /// Deletion requested while the finalizer is still present
    Deleting,
    /// Deletion requested and the finalizer is already gone
    Released,
}

impl SiteState {
    /// Classifies `site` by deletion request and finalizer presence
    pub fn observe(site: &DummySite) -> Self {
        match (site.is_deleting(), site.has_finalizer(FINALIZER)) {
            (false, false) => SiteState::New,
            (false, true) => SiteState::Reconciling,
            (true, true) => SiteState::Deleting,
            (true, false) => SiteState::Released,
        }
    }
}

/// What a reconcile call achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every bundle member was applied and the status reads `Deployed`
    Deployed,
    /// Fetching or applying failed and the status reads `Failed`
    Failed,
    /// The bundle is gone and the finalizer was removed
    CleanedUp,
    /// A delete failed; the finalizer stays until a later attempt succeeds
    TeardownIncomplete,
    /// Deletion is in progress and nothing is left for this controller
    Released,
}

impl ReconcileOutcome {
    /// Metric label for the outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Deployed => "deployed",
            ReconcileOutcome::Failed => "failed",
            ReconcileOutcome::CleanedUp => "cleaned_up",
            ReconcileOutcome::TeardownIncomplete => "teardown_incomplete",
            ReconcileOutcome::Released => "released",
        }
    }
}

/// Reconciles DummySite resources.
pub struct Reconciler {
    pub(crate) resource_client: Box<dyn ResourceClientTrait>,
    pub(crate) fetcher: Box<dyn ContentFetcherTrait>,
    pub(crate) settings: BundleSettings,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        resource_client: Box<dyn ResourceClientTrait>,
        fetcher: Box<dyn ContentFetcherTrait>,
        settings: BundleSettings,
    ) -> Self {
        Self {
            resource_client,
            fetcher,
            settings,
        }
    }

    /// Reconciles a DummySite resource.
    ///
    /// This method:
    /// 1. Adds the finalizer to sites that lack it
    /// 2. Fetches the site content and creates or replaces the bundle
    /// 3. Records the result in the site status
    ///
    /// For sites being deleted it removes the bundle in reverse order and
    /// releases the finalizer once every member is gone.
    pub async fn reconcile(&self, site: &DummySite) -> Result<ReconcileOutcome, ControllerError> {
        let name = site
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| ControllerError::InvalidResource("DummySite missing name".to_string()))?;
        let namespace = site.metadata.namespace.as_deref().unwrap_or("default");

        let state = SiteState::observe(site);
        debug!("Reconciling DummySite {}/{} in state {:?}", namespace, name, state);

        match state {
            SiteState::New => {
                self.add_finalizer(site, namespace, name).await?;
                self.publish(site, namespace, name).await
            }
            SiteState::Reconciling => self.publish(site, namespace, name).await,
            SiteState::Deleting => self.tear_down(site, namespace, name).await,
            SiteState::Released => {
                debug!("DummySite {}/{} is being deleted and holds no finalizer", namespace, name);
                Ok(ReconcileOutcome::Released)
            }
        }
    }

    async fn add_finalizer(&self, site: &DummySite, namespace: &str, name: &str) -> Result<(), ControllerError> {
        let mut finalizers = site.finalizers().to_vec();
        finalizers.push(FINALIZER.to_string());

        self.resource_client
            .patch_finalizers(namespace, name, &finalizers, site.metadata.resource_version.as_deref())
            .await
            .map_err(|e| {
                error!("Failed to add finalizer to DummySite {}/{}: {}", namespace, name, e);
                ControllerError::Finalizer(e)
            })?;

        info!("Added finalizer to DummySite {}/{}", namespace, name);
        Ok(())
    }

    async fn publish(&self, site: &DummySite, namespace: &str, name: &str) -> Result<ReconcileOutcome, ControllerError> {
        info!("Reconciling DummySite {}/{}", namespace, name);
        let generation = site.metadata.generation;

        let content = match self.fetcher.fetch(&site.spec.website_url).await {
            Ok(content) => content,
            Err(e) => {
                metrics::increment_fetch_failures(e.is_transient());
                return self.record_failure(namespace, name, generation, e.into()).await;
            }
        };
        debug!(
            "Fetched {} bytes for DummySite {}/{} from {}",
            content.body.len(),
            namespace,
            name,
            content.url
        );

        let bundle = match DesiredBundle::build(name, namespace, &content.body, &self.settings) {
            Ok(bundle) => bundle,
            Err(e) => return self.record_failure(namespace, name, generation, e.into()).await,
        };

        for member in bundle.members() {
            if let Err(e) = self.upsert(namespace, member).await {
                return self.record_failure(namespace, name, generation, e).await;
            }
        }

        let status = DummySiteStatus::deployed(DEPLOYED_MESSAGE, bundle.url.clone())
            .with_observed_generation(generation);
        self.write_status(namespace, name, &status).await?;

        info!("DummySite {}/{} deployed at {}", namespace, name, bundle.url);
        Ok(ReconcileOutcome::Deployed)
    }

    /// Create `member`, replacing it when it already exists
    async fn upsert(&self, namespace: &str, member: &BundleObject) -> Result<(), ControllerError> {
        let apply_error = |source| ControllerError::Apply {
            kind: member.kind(),
            name: member.name().to_string(),
            source,
        };

        match self.resource_client.create(namespace, member).await.map_err(apply_error)? {
            CreateOutcome::Created => {
                info!("Created {} {}/{}", member.kind(), namespace, member.name());
            }
            CreateOutcome::AlreadyExists => {
                self.resource_client
                    .replace(namespace, member)
                    .await
                    .map_err(apply_error)?;
                debug!("Replaced {} {}/{}", member.kind(), namespace, member.name());
            }
        }
        Ok(())
    }

    async fn tear_down(&self, site: &DummySite, namespace: &str, name: &str) -> Result<ReconcileOutcome, ControllerError> {
        info!("Tearing down DummySite {}/{}", namespace, name);

        for (kind, member_name) in DesiredBundle::teardown_plan(name) {
            match self.resource_client.delete(namespace, kind, &member_name).await {
                Ok(DeleteOutcome::Deleted) => info!("Deleted {} {}/{}", kind, namespace, member_name),
                Ok(DeleteOutcome::NotFound) => debug!("{} {}/{} already gone", kind, namespace, member_name),
                Err(source) => {
                    let err = ControllerError::Teardown {
                        kind,
                        name: member_name,
                        source,
                    };
                    warn!("Keeping finalizer on DummySite {}/{}: {}", namespace, name, err);
                    return Ok(ReconcileOutcome::TeardownIncomplete);
                }
            }
        }

        let remaining: Vec<String> = site
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != FINALIZER)
            .cloned()
            .collect();

        self.resource_client
            .patch_finalizers(namespace, name, &remaining, site.metadata.resource_version.as_deref())
            .await
            .map_err(|e| {
                error!("Failed to remove finalizer from DummySite {}/{}: {}", namespace, name, e);
                ControllerError::Finalizer(e)
            })?;

        info!("Removed finalizer from DummySite {}/{}", namespace, name);
        Ok(ReconcileOutcome::CleanedUp)
    }

    async fn record_failure(
        &self,
        namespace: &str,
        name: &str,
        generation: Option<i64>,
        err: ControllerError,
    ) -> Result<ReconcileOutcome, ControllerError> {
        warn!("DummySite {}/{} failed: {}", namespace, name, err);
        let status = DummySiteStatus::failed(err.to_string()).with_observed_generation(generation);
        self.write_status(namespace, name, &status).await?;
        Ok(ReconcileOutcome::Failed)
    }

    async fn write_status(&self, namespace: &str, name: &str, status: &DummySiteStatus) -> Result<(), ControllerError> {
        self.resource_client
            .patch_status(namespace, name, status)
            .await
            .map_err(|e| {
                error!("Failed to update DummySite {}/{} status: {}", namespace, name, e);
                ControllerError::Status(e)
            })
    }
}
