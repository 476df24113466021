//! Kubernetes resource watcher.
//!
//! Drives DummySite reconciliation through `kube_runtime::Controller`. The
//! controller keeps at most one reconcile in flight per object, folds events
//! that arrive meanwhile into a single rerun, and caps parallelism across
//! objects. Reconnection after a broken watch uses its default backoff.

use crate::error::ControllerError;
use crate::metrics;
use crate::reconciler::Reconciler;
use crds::DummySite;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::reflector::Store;
use kube_runtime::{watcher, Controller};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Watches DummySite resources for changes.
pub struct Watcher {
    api: Api<DummySite>,
    reconciler: Arc<Reconciler>,
    concurrency: u16,
    ready: Arc<AtomicBool>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("concurrency", &self.concurrency)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Creates a new watcher instance.
    ///
    /// `ready` flips to true once the initial listing has been loaded.
    pub fn new(
        api: Api<DummySite>,
        reconciler: Arc<Reconciler>,
        max_concurrent_reconciles: usize,
        ready: Arc<AtomicBool>,
    ) -> Self {
        Self {
            api,
            reconciler,
            concurrency: u16::try_from(max_concurrent_reconciles.max(1)).unwrap_or(u16::MAX),
            ready,
        }
    }

    /// Starts watching DummySite resources.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!(
            "Starting DummySite watcher (max {} concurrent reconciles)",
            self.concurrency
        );

        let controller = Controller::new(self.api, watcher::Config::default())
            .with_config(ControllerConfig::default().concurrency(self.concurrency));
        tokio::spawn(mark_ready_when_synced(controller.store(), self.ready));

        controller
            .run(reconcile, error_policy, self.reconciler)
            .for_each(|res| async move {
                match res {
                    Ok((site, _)) => debug!("Reconcile finished for {}", site),
                    Err(e) => warn!("DummySite controller error: {}", e),
                }
            })
            .await;

        Err(ControllerError::Watch("DummySite controller stream ended".to_string()))
    }
}

async fn mark_ready_when_synced(store: Store<DummySite>, ready: Arc<AtomicBool>) {
    if store.wait_until_ready().await.is_ok() {
        ready.store(true, Ordering::Relaxed);
        info!("Initial DummySite listing loaded");
    }
}

fn site_key(site: &DummySite) -> String {
    format!("{}/{}", site.namespace().unwrap_or_default(), site.name_any())
}

/// Reconciles one DummySite and records its metrics.
///
/// Nothing is requeued on a timer; the next change to the object runs it again.
pub(crate) async fn reconcile(site: Arc<DummySite>, reconciler: Arc<Reconciler>) -> Result<Action, ControllerError> {
    let start = Instant::now();
    let result = reconciler.reconcile(&site).await;
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => {
            metrics::increment_reconciliations(outcome.as_str());
            debug!("Reconciled DummySite {}: {:?}", site_key(&site), outcome);
            Ok(Action::await_change())
        }
        Err(e) => {
            metrics::increment_reconciliation_errors();
            Err(e)
        }
    }
}

/// Failed reconciles also wait for the next change instead of a retry timer
pub(crate) fn error_policy(site: Arc<DummySite>, error: &ControllerError, _reconciler: Arc<Reconciler>) -> Action {
    error!("Reconciliation failed for DummySite {}: {}", site_key(&site), error);
    Action::await_change()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::FINALIZER;
    use crate::test_utils::{
        create_finalized_site, create_test_reconciler, create_test_site, mark_deleting, TEST_URL,
    };
    use bundle_client::{BundleKind, MockResourceClient, Operation};
    use content_fetcher::{MockContentFetcher, MockFailure};
    use crds::SitePhase;
    use kube_runtime::watcher::Event;
    use std::time::Duration;

    fn context(resources: &MockResourceClient, fetcher: &MockContentFetcher) -> Arc<Reconciler> {
        Arc::new(create_test_reconciler(resources, fetcher))
    }

    #[tokio::test]
    async fn test_deployed_site_waits_for_next_change() {
        let resources = MockResourceClient::new();
        let fetcher = MockContentFetcher::new();
        fetcher.set_body(TEST_URL, "<h1>hi</h1>");

        let action = reconcile(
            Arc::new(create_finalized_site("foo", TEST_URL)),
            context(&resources, &fetcher),
        )
        .await
        .unwrap();

        assert_eq!(action, Action::await_change());
        assert_eq!(resources.last_status("demo", "foo").unwrap().phase, SitePhase::Deployed);
    }

    #[tokio::test]
    async fn test_failed_site_is_not_requeued() {
        let resources = MockResourceClient::new();
        let fetcher = MockContentFetcher::new();
        fetcher.set_failure(TEST_URL, MockFailure::Timeout);

        let action = reconcile(
            Arc::new(create_finalized_site("foo", TEST_URL)),
            context(&resources, &fetcher),
        )
        .await
        .unwrap();

        assert_eq!(action, Action::await_change());
        assert_eq!(resources.last_status("demo", "foo").unwrap().phase, SitePhase::Failed);
    }

    #[tokio::test]
    async fn test_incomplete_teardown_is_not_requeued() {
        let resources = MockResourceClient::new();
        let fetcher = MockContentFetcher::new();
        resources.fail_on(Operation::Delete, BundleKind::Service, 500, "boom");

        let site = mark_deleting(create_finalized_site("foo", TEST_URL));
        let action = reconcile(Arc::new(site), context(&resources, &fetcher))
            .await
            .unwrap();

        assert_eq!(action, Action::await_change());
        assert!(resources.last_finalizers("demo", "foo").is_none());
    }

    #[tokio::test]
    async fn test_reconcile_errors_reach_error_policy() {
        let resources = MockResourceClient::new();
        let fetcher = MockContentFetcher::new();
        resources.fail_finalizer_patch(409, "the object has been modified");

        let site = Arc::new(create_test_site("foo", TEST_URL, &[]));
        let ctx = context(&resources, &fetcher);
        let err = reconcile(site.clone(), ctx.clone()).await.unwrap_err();
        assert!(matches!(err, ControllerError::Finalizer(_)));

        assert_eq!(error_policy(site, &err, ctx), Action::await_change());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_finalizer_added_before_publish() {
        let resources = MockResourceClient::new();
        let fetcher = MockContentFetcher::new();
        fetcher.set_body(TEST_URL, "<h1>hi</h1>");

        reconcile(
            Arc::new(create_test_site("foo", TEST_URL, &[])),
            context(&resources, &fetcher),
        )
        .await
        .unwrap();

        assert_eq!(
            resources.last_finalizers("demo", "foo"),
            Some(vec![FINALIZER.to_string()])
        );
    }

    #[tokio::test]
    async fn test_ready_after_initial_listing() {
        let (store, mut writer) = kube_runtime::reflector::store::<DummySite>();
        let ready = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(mark_ready_when_synced(store, ready.clone()));

        writer.apply_watcher_event(&Event::Init);
        writer.apply_watcher_event(&Event::InitApply(create_test_site("foo", TEST_URL, &[])));
        tokio::task::yield_now().await;
        assert!(!ready.load(Ordering::Relaxed));

        writer.apply_watcher_event(&Event::InitDone);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(ready.load(Ordering::Relaxed));
    }
}
