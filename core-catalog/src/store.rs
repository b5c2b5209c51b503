//! Observable Archive Catalog Store
//!
//! The catalog is the sole shared mutable resource of the engine. Every
//! mutation goes through [`CatalogStore::upsert`], [`CatalogStore::remove`]
//! or [`CatalogStore::apply`]; each call commits one SQLite transaction and
//! one in-memory update under the write lock, so no observer ever sees a
//! torn state.
//!
//! Observation is two-channel: [`CatalogEvent`]s on the shared
//! [`EventBus`] describe what changed, and a `watch`-style generation
//! counter lets pollers cheaply detect that anything changed.

use crate::error::{CatalogError, Result};
use crate::models::ArchiveRecord;
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use host_traits::documents::DocumentHandle;
use sqlx::{FromRow, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

/// Reconciliation batch: inserts/replacements plus removals, committed
/// atomically so observers see one consistent update.
#[derive(Debug, Clone, Default)]
pub struct CatalogBatch {
    pub upserts: Vec<ArchiveRecord>,
    pub removals: Vec<DocumentHandle>,
}

impl CatalogBatch {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty()
    }
}

/// Persisted, observable collection of [`ArchiveRecord`]s keyed by handle.
pub struct CatalogStore {
    pool: SqlitePool,
    records: RwLock<BTreeMap<DocumentHandle, ArchiveRecord>>,
    events: Arc<EventBus>,
    generation: watch::Sender<u64>,
}

impl CatalogStore {
    /// Open the store over an already-migrated pool, loading all persisted
    /// records into the in-memory snapshot.
    pub async fn open(pool: SqlitePool, events: Arc<EventBus>) -> Result<Self> {
        let rows = sqlx::query_as::<_, RecordRow>("SELECT * FROM archives")
            .fetch_all(&pool)
            .await?;

        let mut records = BTreeMap::new();
        for row in rows {
            let record = row.into_record();
            records.insert(record.handle.clone(), record);
        }

        info!(count = records.len(), "Opened archive catalog");

        let (generation, _) = watch::channel(0u64);
        Ok(Self {
            pool,
            records: RwLock::new(records),
            events,
            generation,
        })
    }

    /// Point-in-time copy of all records. Never contains duplicate handles.
    pub async fn snapshot(&self) -> Vec<ArchiveRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Look up one record by handle.
    pub async fn get(&self, handle: &DocumentHandle) -> Option<ArchiveRecord> {
        self.records.read().await.get(handle).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Insert or replace a record by handle.
    pub async fn upsert(&self, record: ArchiveRecord) -> Result<()> {
        let mut guard = self.records.write().await;
        persist(&self.pool, &record).await?;
        guard.insert(record.handle.clone(), record.clone());
        drop(guard);

        self.bump();
        self.events
            .emit(CoreEvent::Catalog(CatalogEvent::RecordUpserted {
                handle: record.handle.to_string(),
            }))
            .ok();
        Ok(())
    }

    /// Remove a record. Removing an absent handle is a no-op and returns
    /// `false`.
    pub async fn remove(&self, handle: &DocumentHandle) -> Result<bool> {
        let mut guard = self.records.write().await;
        if !guard.contains_key(handle) {
            return Ok(false);
        }

        sqlx::query("DELETE FROM archives WHERE handle = ?")
            .bind(handle.as_str())
            .execute(&self.pool)
            .await?;
        guard.remove(handle);
        drop(guard);

        self.bump();
        self.events
            .emit(CoreEvent::Catalog(CatalogEvent::RecordRemoved {
                handle: handle.to_string(),
            }))
            .ok();
        Ok(true)
    }

    /// Commit a reconciliation batch as one transaction and one in-memory
    /// update. Emits a single `BatchApplied` event. Empty batches are a
    /// no-op without event.
    pub async fn apply(&self, batch: CatalogBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut guard = self.records.write().await;
        let mut tx = self.pool.begin().await?;
        for record in &batch.upserts {
            persist(&mut *tx, record).await?;
        }
        for handle in &batch.removals {
            sqlx::query("DELETE FROM archives WHERE handle = ?")
                .bind(handle.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        for record in &batch.upserts {
            guard.insert(record.handle.clone(), record.clone());
        }
        for handle in &batch.removals {
            guard.remove(handle);
        }
        drop(guard);

        debug!(
            added = batch.upserts.len(),
            removed = batch.removals.len(),
            "Applied catalog batch"
        );
        self.bump();
        self.events
            .emit(CoreEvent::Catalog(CatalogEvent::BatchApplied {
                added: batch.upserts.len() as u64,
                removed: batch.removals.len() as u64,
            }))
            .ok();
        Ok(())
    }

    /// Clear the `loaded` flag of one record so the next synchronization
    /// pass re-attempts enrichment. The explicit retry affordance for
    /// records whose first extraction failed transiently.
    pub async fn force_refresh(&self, handle: &DocumentHandle) -> Result<bool> {
        let mut guard = self.records.write().await;
        let Some(record) = guard.get_mut(handle) else {
            return Ok(false);
        };

        sqlx::query("UPDATE archives SET loaded = 0, updated_at = ? WHERE handle = ?")
            .bind(chrono::Utc::now().timestamp())
            .bind(handle.as_str())
            .execute(&self.pool)
            .await?;
        record.loaded = false;
        drop(guard);

        self.bump();
        self.events
            .emit(CoreEvent::Catalog(CatalogEvent::RefreshRequested {
                handle: handle.to_string(),
            }))
            .ok();
        Ok(true)
    }

    /// Generation counter, bumped on every committed mutation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Watch the generation counter for changes.
    pub fn watch_generation(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    fn bump(&self) {
        self.generation.send_modify(|g| *g += 1);
    }
}

async fn persist<'e, E>(executor: E, record: &ArchiveRecord) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO archives (
            handle, display_name, mime_type, last_modified, size_bytes,
            app_name, package_name, version_name, version_code,
            min_sdk, target_sdk, icon, loaded, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(handle) DO UPDATE SET
            display_name = excluded.display_name,
            mime_type = excluded.mime_type,
            last_modified = excluded.last_modified,
            size_bytes = excluded.size_bytes,
            app_name = excluded.app_name,
            package_name = excluded.package_name,
            version_name = excluded.version_name,
            version_code = excluded.version_code,
            min_sdk = excluded.min_sdk,
            target_sdk = excluded.target_sdk,
            icon = excluded.icon,
            loaded = excluded.loaded,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(record.handle.as_str())
    .bind(&record.display_name)
    .bind(&record.mime_type)
    .bind(record.last_modified)
    .bind(record.size_bytes as i64)
    .bind(&record.app_name)
    .bind(&record.package_name)
    .bind(&record.version_name)
    .bind(record.version_code)
    .bind(record.min_sdk)
    .bind(record.target_sdk)
    .bind(&record.icon)
    .bind(record.loaded)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await
    .map_err(CatalogError::Database)?;
    Ok(())
}

/// Raw row shape; converted into the public model on read.
#[derive(FromRow)]
struct RecordRow {
    handle: String,
    display_name: String,
    mime_type: Option<String>,
    last_modified: i64,
    size_bytes: i64,
    app_name: Option<String>,
    package_name: Option<String>,
    version_name: Option<String>,
    version_code: Option<i64>,
    min_sdk: Option<i32>,
    target_sdk: Option<i32>,
    icon: Option<Vec<u8>>,
    loaded: bool,
    #[allow(dead_code)]
    created_at: i64,
    #[allow(dead_code)]
    updated_at: i64,
}

impl RecordRow {
    fn into_record(self) -> ArchiveRecord {
        ArchiveRecord {
            handle: DocumentHandle::new(self.handle),
            display_name: self.display_name,
            mime_type: self.mime_type,
            last_modified: self.last_modified,
            size_bytes: self.size_bytes as u64,
            app_name: self.app_name,
            package_name: self.package_name,
            version_name: self.version_name,
            version_code: self.version_code,
            min_sdk: self.min_sdk,
            target_sdk: self.target_sdk,
            icon: self.icon,
            loaded: self.loaded,
        }
    }
}
