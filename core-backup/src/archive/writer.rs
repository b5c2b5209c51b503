//! Archive Writer
//!
//! Streams APK sources into the user-chosen backup directory through the
//! [`DocumentStore`] boundary. Single-part archives are copied verbatim and
//! size-verified; multi-part archives are packed into a zip container in a
//! local staging file first, then streamed to the destination. Partial
//! destination documents are deleted on any failure, so the backup directory
//! never accumulates corrupt output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use core_catalog::APK_MIME_TYPE;
use host_traits::documents::{DocumentHandle, DocumentStore};
use host_traits::settings::BundleSuffix;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;
use zip::write::SimpleFileOptions;

use crate::error::{BackupError, Result};

/// MIME type stamped onto bundle documents; `.apks`/`.xapk` have no
/// registered type of their own.
const BUNDLE_MIME_TYPE: &str = "application/octet-stream";

/// Per-part completion callback; called with the count of parts finished so
/// far. May be invoked from a blocking worker thread.
pub type PartProgress = Arc<dyn Fn(u64) + Send + Sync>;

/// One source file destined for an archive.
#[derive(Debug, Clone)]
pub struct ArchivePart {
    /// Entry name inside a bundle container, e.g. `base.apk`.
    pub entry_name: String,
    /// Source path on the host filesystem.
    pub source: PathBuf,
    /// Size the source reported when the part was planned.
    pub expected_size: u64,
}

/// Writes backup archives into a destination directory handle.
#[derive(Clone)]
pub struct ArchiveWriter {
    store: Arc<dyn DocumentStore>,
    staging_dir: PathBuf,
}

impl ArchiveWriter {
    pub fn new(store: Arc<dyn DocumentStore>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            staging_dir: staging_dir.into(),
        }
    }

    /// Write `parts` into `dir` under `base_name` (no extension).
    ///
    /// A single part with bundling off becomes a verbatim `.apk` copy;
    /// anything else becomes a zip container named with `suffix`. Returns the
    /// handle of the finished document.
    pub async fn write(
        &self,
        parts: &[ArchivePart],
        dir: &DocumentHandle,
        base_name: &str,
        bundle: bool,
        suffix: BundleSuffix,
        on_part_done: PartProgress,
    ) -> Result<DocumentHandle> {
        if parts.is_empty() {
            return Err(BackupError::Io("no source parts to write".into()));
        }

        if bundle || parts.len() > 1 {
            self.write_bundle(parts, dir, base_name, suffix, on_part_done)
                .await
        } else {
            self.write_single(&parts[0], dir, base_name, on_part_done)
                .await
        }
    }

    async fn write_single(
        &self,
        part: &ArchivePart,
        dir: &DocumentHandle,
        base_name: &str,
        on_part_done: PartProgress,
    ) -> Result<DocumentHandle> {
        let mut source = tokio::fs::File::open(&part.source)
            .await
            .map_err(|e| source_error(e, &part.source))?;

        let name = format!("{base_name}.apk");
        let dest = self.store.create_document(dir, &name, APK_MIME_TYPE).await?;
        debug!(%dest, "writing single-part archive");

        let mut writer = self.store.open_write(&dest).await?;
        let copied = match tokio::io::copy(&mut source, &mut writer).await {
            Ok(n) => n,
            Err(e) => {
                drop(writer);
                self.discard(&dest).await;
                return Err(e.into());
            }
        };
        if let Err(e) = writer.shutdown().await {
            drop(writer);
            self.discard(&dest).await;
            return Err(e.into());
        }
        drop(writer);

        if copied != part.expected_size {
            self.discard(&dest).await;
            return Err(BackupError::SizeMismatch {
                expected: part.expected_size,
                actual: copied,
            });
        }

        on_part_done(1);
        Ok(dest)
    }

    async fn write_bundle(
        &self,
        parts: &[ArchivePart],
        dir: &DocumentHandle,
        base_name: &str,
        suffix: BundleSuffix,
        on_part_done: PartProgress,
    ) -> Result<DocumentHandle> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let staging = self
            .staging_dir
            .join(format!("bundle-{}.zip", Uuid::new_v4()));

        // The zip crate is synchronous; pack on a blocking worker.
        let build_parts = parts.to_vec();
        let build_path = staging.clone();
        let progress = Arc::clone(&on_part_done);
        let packed = tokio::task::spawn_blocking(move || {
            pack_container(&build_path, &build_parts, progress)
        })
        .await
        .map_err(|e| BackupError::Io(e.to_string()))?;

        if let Err(e) = packed {
            remove_staging(&staging).await;
            return Err(e);
        }

        let name = format!("{base_name}{}", suffix.extension());
        let dest = match self.store.create_document(dir, &name, BUNDLE_MIME_TYPE).await {
            Ok(handle) => handle,
            Err(e) => {
                remove_staging(&staging).await;
                return Err(e.into());
            }
        };
        debug!(%dest, parts = parts.len(), "writing bundle archive");

        if let Err(e) = self.stream_to(&staging, &dest).await {
            self.discard(&dest).await;
            remove_staging(&staging).await;
            return Err(e);
        }

        remove_staging(&staging).await;
        Ok(dest)
    }

    async fn stream_to(&self, staging: &Path, dest: &DocumentHandle) -> Result<()> {
        let mut source = tokio::fs::File::open(staging).await?;
        let mut writer = self.store.open_write(dest).await?;
        tokio::io::copy(&mut source, &mut writer).await?;
        writer.shutdown().await?;
        Ok(())
    }

    /// Best-effort removal of a partially written destination document.
    async fn discard(&self, handle: &DocumentHandle) {
        if let Err(e) = self.store.delete(handle).await {
            warn!(%handle, error = %e, "failed to remove partial archive");
        }
    }
}

fn pack_container(path: &Path, parts: &[ArchivePart], on_part_done: PartProgress) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut container = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut done = 0u64;
    for part in parts {
        let mut source =
            std::fs::File::open(&part.source).map_err(|e| source_error(e, &part.source))?;
        container.start_file(part.entry_name.as_str(), options)?;
        std::io::copy(&mut source, &mut container)?;
        done += 1;
        on_part_done(done);
    }

    container.finish()?;
    Ok(())
}

/// Attribute source read failures to the source path; a vanished source is
/// `NotFound`, not a generic IO error.
fn source_error(e: std::io::Error, source: &Path) -> BackupError {
    match e.kind() {
        std::io::ErrorKind::NotFound => BackupError::NotFound(source.display().to_string()),
        _ => e.into(),
    }
}

async fn remove_staging(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove staging file");
        }
    }
}
