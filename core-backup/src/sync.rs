//! Synchronizer
//!
//! Reconciles the archive catalog with the backup directory:
//!
//! 1. scan the directory (degrades to empty when unreadable)
//! 2. set-diff against the catalog snapshot by handle
//! 3. commit additions and removals as one atomic catalog batch
//! 4. load metadata for every record still missing enrichment, sequentially,
//!    in the user's sort order, honoring cancellation between records
//!
//! Passes are idempotent: running twice against an unchanged directory
//! performs no catalog mutations the second time.

use std::collections::HashSet;
use std::sync::Arc;

use core_catalog::{sort_records, ArchiveRecord, CatalogBatch, CatalogStore};
use core_runtime::events::{CoreEvent, EventBus, SyncRunEvent};
use host_traits::documents::DocumentHandle;
use host_traits::settings::BackupSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{BackupError, Result};
use crate::loader::MetadataLoader;
use crate::scanner::DirectoryScanner;

/// Counts describing one completed synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub added: u64,
    pub removed: u64,
    pub loaded: u64,
}

#[derive(Clone)]
pub struct Synchronizer {
    scanner: DirectoryScanner,
    catalog: Arc<CatalogStore>,
    loader: MetadataLoader,
    settings: Arc<dyn BackupSettings>,
    events: Arc<EventBus>,
}

impl Synchronizer {
    pub fn new(
        scanner: DirectoryScanner,
        catalog: Arc<CatalogStore>,
        loader: MetadataLoader,
        settings: Arc<dyn BackupSettings>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            scanner,
            catalog,
            loader,
            settings,
            events,
        }
    }

    /// Run one reconciliation pass. Cancellation is honored between records
    /// during the load phase; the catalog batch itself is never interrupted.
    pub async fn sync(&self, cancel: &CancellationToken) -> Result<SyncStats> {
        let Some(dir) = self.settings.backup_directory().await.map_err(BackupError::from)? else {
            debug!("no backup directory configured; nothing to synchronize");
            return Ok(SyncStats::default());
        };

        let run_id = Uuid::new_v4().to_string();
        self.events
            .emit(CoreEvent::Sync(SyncRunEvent::Started {
                run_id: run_id.clone(),
            }))
            .ok();

        let on_disk = self.scanner.scan(&dir).await;
        let snapshot = self.catalog.snapshot().await;

        let disk_handles: HashSet<&DocumentHandle> = on_disk.iter().map(|i| &i.handle).collect();
        let known_handles: HashSet<&DocumentHandle> = snapshot.iter().map(|r| &r.handle).collect();

        let additions: Vec<ArchiveRecord> = on_disk
            .iter()
            .filter(|info| !known_handles.contains(&info.handle))
            .map(ArchiveRecord::from_listing)
            .collect();
        let removals: Vec<DocumentHandle> = snapshot
            .iter()
            .filter(|record| !disk_handles.contains(&record.handle))
            .map(|record| record.handle.clone())
            .collect();

        let added = additions.len() as u64;
        let removed = removals.len() as u64;

        // New records plus surviving records whose enrichment is pending.
        let mut pending: Vec<ArchiveRecord> = additions.clone();
        pending.extend(
            snapshot
                .iter()
                .filter(|r| !r.loaded && disk_handles.contains(&r.handle))
                .cloned(),
        );

        self.catalog
            .apply(CatalogBatch {
                upserts: additions,
                removals,
            })
            .await?;

        let order = self.settings.sort_order().await.map_err(BackupError::from)?;
        sort_records(&mut pending, order);

        let mut loaded = 0u64;
        for record in &pending {
            if cancel.is_cancelled() {
                self.events
                    .emit(CoreEvent::Sync(SyncRunEvent::Cancelled { run_id, loaded }))
                    .ok();
                return Err(BackupError::Cancelled);
            }

            // Sequential on purpose: every load stages the archive into a
            // temp file, and parallel loads over a large catalog could
            // exhaust local storage.
            let enriched = self.loader.load(record).await;
            self.catalog.upsert(enriched).await?;
            loaded += 1;
        }

        info!(added, removed, loaded, "sync pass completed");
        self.events
            .emit(CoreEvent::Sync(SyncRunEvent::Completed {
                run_id,
                added,
                removed,
                loaded,
            }))
            .ok();
        Ok(SyncStats {
            added,
            removed,
            loaded,
        })
    }
}
