use crate::bom_processing::domain::identifiers::processed_blob_tag;
use crate::bom_processing::domain::{BomRecord, EnrichmentStatus};
use crate::ports::outbound::{CatalogRepository, ContentStore, EnrichmentClient};
use crate::shared::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub batch_size: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            batch_size: 10,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub selected: usize,
    pub completed: usize,
    pub failed: usize,
    /// The cycle did not run: no client configured, or one already in flight
    pub skipped: bool,
}

/// EnrichmentScheduler - recurring enrichment of stored BOMs
///
/// A no-op without an enrichment client. Failures are recorded on the
/// record as `FAILED` and picked up again on a later cycle; they never
/// reach a caller.
pub struct EnrichmentScheduler {
    catalog: Arc<dyn CatalogRepository>,
    content_store: Arc<dyn ContentStore>,
    client: Option<Arc<dyn EnrichmentClient>>,
    settings: SchedulerSettings,
    running: AtomicBool,
}

/// Clears the in-flight flag however a cycle ends, including cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl EnrichmentScheduler {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        content_store: Arc<dyn ContentStore>,
        client: Option<Arc<dyn EnrichmentClient>>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            catalog,
            content_store,
            client,
            settings,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Runs one cycle. Returns immediately when a cycle is already running.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let Some(client) = self.client.as_ref() else {
            tracing::debug!("Enrichment not configured, skipping cycle");
            return Ok(CycleSummary {
                skipped: true,
                ..CycleSummary::default()
            });
        };

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Previous enrichment cycle still running, skipping");
            return Ok(CycleSummary {
                skipped: true,
                ..CycleSummary::default()
            });
        }
        let _in_flight = InFlight(&self.running);

        let records = self
            .catalog
            .find_needing_enrichment(self.settings.batch_size)
            .await?;
        let mut summary = CycleSummary {
            selected: records.len(),
            ..CycleSummary::default()
        };
        if records.is_empty() {
            tracing::debug!("No records pending enrichment");
            return Ok(summary);
        }
        tracing::info!(count = records.len(), "Starting enrichment cycle");

        for record in &records {
            match self.enrich_record(client.as_ref(), record).await {
                Ok(()) => {
                    summary.completed += 1;
                    tracing::info!(bom_uuid = %record.uuid, "Enrichment completed");
                }
                Err(e) => {
                    summary.failed += 1;
                    let message = format!("{:#}", e);
                    tracing::warn!(bom_uuid = %record.uuid, error = %message, "Enrichment failed");
                    if let Err(update_error) = self
                        .catalog
                        .update_enrichment(&record.uuid, EnrichmentStatus::Failed, Some(message))
                        .await
                    {
                        tracing::error!(
                            bom_uuid = %record.uuid,
                            error = %update_error,
                            "Could not record enrichment failure"
                        );
                    }
                }
            }
        }

        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            "Enrichment cycle finished"
        );
        Ok(summary)
    }

    async fn enrich_record(&self, client: &dyn EnrichmentClient, record: &BomRecord) -> Result<()> {
        self.catalog
            .update_enrichment(&record.uuid, EnrichmentStatus::Pending, None)
            .await?;

        let tag = record
            .processed_blob
            .as_ref()
            .map(|b| b.tag.clone())
            .unwrap_or_else(|| processed_blob_tag(&record.uuid));
        let content = self.content_store.fetch(&tag).await?;
        let enriched = client.enrich(&content).await?;
        self.content_store.push(&tag, &enriched).await?;

        self.catalog
            .update_enrichment(&record.uuid, EnrichmentStatus::Completed, None)
            .await
    }

    /// Starts the recurring task: one cycle right away, then one per interval.
    ///
    /// Ticks missed while a long cycle runs are skipped, not replayed.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval_period = self.settings.interval;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(interval_secs = interval_period.as_secs(), "Enrichment scheduler started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.run_cycle().await {
                            tracing::error!(error = %format!("{:#}", e), "Enrichment cycle aborted");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::info!("Enrichment scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }
}

/// Owner of a spawned scheduler. Dropping it without `shutdown` also stops
/// the loop once the current cycle finishes.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops scheduling new cycles and waits for the loop to exit.
    pub async fn shutdown(self) {
        // A closed receiver means the loop has already exited.
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Enrichment scheduler task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::{InMemoryCatalog, InMemoryContentStore};
    use crate::bom_processing::domain::{BomMeta, BomRecord};
    use crate::shared::error::RebomError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct AppendingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EnrichmentClient for AppendingClient {
        async fn enrich(&self, content: &[u8]) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut value: serde_json::Value = serde_json::from_slice(content)?;
            value["enriched"] = serde_json::Value::Bool(true);
            Ok(serde_json::to_vec(&value)?)
        }
    }

    struct FailingClient;

    #[async_trait]
    impl EnrichmentClient for FailingClient {
        async fn enrich(&self, _content: &[u8]) -> Result<Vec<u8>> {
            Err(RebomError::tool("rearm-cli", "service unavailable").into())
        }
    }

    async fn seed(catalog: &InMemoryCatalog, store: &InMemoryContentStore, serial: &str) -> BomRecord {
        let record = BomRecord::new(serial, 1, "org-1", BomMeta::default());
        store
            .push(&processed_blob_tag(&record.uuid), br#"{"bomFormat":"CycloneDX"}"#)
            .await
            .unwrap();
        catalog.insert(record).await.unwrap()
    }

    fn scheduler(
        catalog: &InMemoryCatalog,
        store: &InMemoryContentStore,
        client: Option<Arc<dyn EnrichmentClient>>,
    ) -> EnrichmentScheduler {
        EnrichmentScheduler::new(
            Arc::new(catalog.clone()),
            Arc::new(store.clone()),
            client,
            SchedulerSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_cycle_without_client_is_noop() {
        let catalog = InMemoryCatalog::new();
        let store = InMemoryContentStore::new();
        seed(&catalog, &store, "urn:uuid:a").await;

        let summary = scheduler(&catalog, &store, None).run_cycle().await.unwrap();
        assert!(summary.skipped);
        assert_eq!(catalog.all_records().await[0].enrichment_status, None);
    }

    #[tokio::test]
    async fn test_cycle_enriches_and_completes() {
        let catalog = InMemoryCatalog::new();
        let store = InMemoryContentStore::new();
        let record = seed(&catalog, &store, "urn:uuid:a").await;
        let client = Arc::new(AppendingClient {
            calls: AtomicUsize::new(0),
        });

        let summary = scheduler(&catalog, &store, Some(client.clone()))
            .run_cycle()
            .await
            .unwrap();
        assert_eq!(summary.completed, 1);

        let stored = catalog.all_records().await;
        assert_eq!(stored[0].enrichment_status, Some(EnrichmentStatus::Completed));
        assert!(stored[0].enrichment_updated_at.is_some());
        let content = store.fetch(&processed_blob_tag(&record.uuid)).await.unwrap();
        assert!(String::from_utf8(content).unwrap().contains("enriched"));

        // Completed records are not selected again.
        let second = scheduler(&catalog, &store, Some(client.clone()))
            .run_cycle()
            .await
            .unwrap();
        assert_eq!(second.selected, 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_recorded_and_retried() {
        let catalog = InMemoryCatalog::new();
        let store = InMemoryContentStore::new();
        seed(&catalog, &store, "urn:uuid:a").await;
        let scheduler = scheduler(&catalog, &store, Some(Arc::new(FailingClient)));

        let summary = scheduler.run_cycle().await.unwrap();
        assert_eq!(summary.failed, 1);
        let stored = catalog.all_records().await;
        assert_eq!(stored[0].enrichment_status, Some(EnrichmentStatus::Failed));
        assert!(stored[0].enrichment_error.is_some());

        let retry = scheduler.run_cycle().await.unwrap();
        assert_eq!(retry.selected, 1);
    }

    #[tokio::test]
    async fn test_in_flight_cycle_suppresses_another() {
        let catalog = InMemoryCatalog::new();
        let store = InMemoryContentStore::new();
        let scheduler = scheduler(&catalog, &store, Some(Arc::new(FailingClient)));

        scheduler.running.store(true, Ordering::Release);
        assert!(scheduler.run_cycle().await.unwrap().skipped);

        scheduler.running.store(false, Ordering::Release);
        assert!(!scheduler.run_cycle().await.unwrap().skipped);
    }

    #[tokio::test]
    async fn test_spawned_scheduler_runs_immediately_and_shuts_down() {
        let catalog = InMemoryCatalog::new();
        let store = InMemoryContentStore::new();
        seed(&catalog, &store, "urn:uuid:a").await;
        let client = Arc::new(AppendingClient {
            calls: AtomicUsize::new(0),
        });
        let scheduler = Arc::new(EnrichmentScheduler::new(
            Arc::new(catalog.clone()),
            Arc::new(store.clone()),
            Some(client.clone()),
            SchedulerSettings {
                interval: Duration::from_secs(3600),
                batch_size: 5,
            },
        ));

        let handle = scheduler.spawn();
        for _ in 0..50 {
            if client.calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.shutdown().await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
