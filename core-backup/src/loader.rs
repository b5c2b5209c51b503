//! Metadata Loader
//!
//! Enriches catalog records with parsed package metadata. The archive is
//! staged from its document handle into a local temp file, the primary APK is
//! extracted next to it, and the host's package inspector parses that file.
//! Both temp files are removed before returning, on success and on failure.
//!
//! Failures are soft: the record comes back marked as attempted so the next
//! synchronization pass does not retry it. An explicit
//! [`force_refresh`](core_catalog::CatalogStore::force_refresh) is the way
//! to retry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use core_catalog::ArchiveRecord;
use host_traits::documents::DocumentStore;
use host_traits::inspect::{PackageInspector, PackageMetadata};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::archive::reader_for;
use crate::error::{BackupError, Result};

#[derive(Clone)]
pub struct MetadataLoader {
    store: Arc<dyn DocumentStore>,
    inspector: Arc<dyn PackageInspector>,
    staging_dir: PathBuf,
}

impl MetadataLoader {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        inspector: Arc<dyn PackageInspector>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            inspector,
            staging_dir: staging_dir.into(),
        }
    }

    /// Produce the enriched version of `record`. Never fails: extraction
    /// errors yield the record marked as attempted with enrichment untouched.
    pub async fn load(&self, record: &ArchiveRecord) -> ArchiveRecord {
        match self.try_load(record).await {
            Ok(metadata) => {
                debug!(handle = %record.handle, "loaded archive metadata");
                record.enriched(metadata)
            }
            Err(e) => {
                warn!(handle = %record.handle, error = %e, "metadata extraction failed");
                record.attempted()
            }
        }
    }

    async fn try_load(&self, record: &ArchiveRecord) -> Result<PackageMetadata> {
        let kind = record.kind().ok_or_else(|| {
            BackupError::Decode(format!("unrecognized archive type: {}", record.display_name))
        })?;

        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let token = Uuid::new_v4();
        let raw = self.staging_dir.join(format!("{token}.archive"));
        let apk = self.staging_dir.join(format!("{token}.apk"));

        let result = self.stage_and_inspect(record, kind, &raw, &apk).await;

        remove_quiet(&raw).await;
        remove_quiet(&apk).await;
        result
    }

    async fn stage_and_inspect(
        &self,
        record: &ArchiveRecord,
        kind: core_catalog::ArchiveKind,
        raw: &Path,
        apk: &Path,
    ) -> Result<PackageMetadata> {
        let mut reader = self.store.open_read(&record.handle).await?;
        let mut staged = tokio::fs::File::create(raw).await?;
        tokio::io::copy(&mut reader, &mut staged).await?;
        staged.flush().await?;
        drop(staged);

        let archive_reader = reader_for(kind);
        let (raw, apk_path) = (raw.to_path_buf(), apk.to_path_buf());
        tokio::task::spawn_blocking(move || archive_reader.extract_primary(&raw, &apk_path))
            .await
            .map_err(|e| BackupError::Io(e.to_string()))??;

        self.inspector.inspect(apk).await.map_err(BackupError::from)
    }
}

async fn remove_quiet(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove staging file");
        }
    }
}
