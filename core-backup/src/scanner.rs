//! Directory Scanner
//!
//! Lists the backup directory and keeps only documents that classify as
//! archives. An unreadable directory (revoked permission, unplugged storage)
//! degrades to an empty listing: the synchronizer then treats every cataloged
//! record as removed, which matches what the user sees.

use std::sync::Arc;

use core_catalog::ArchiveKind;
use host_traits::documents::{DocumentHandle, DocumentInfo, DocumentStore};
use tracing::debug;

#[derive(Clone)]
pub struct DirectoryScanner {
    store: Arc<dyn DocumentStore>,
}

impl DirectoryScanner {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Recognized archives directly inside `dir`. Never fails; errors are
    /// logged and reported as an empty directory.
    pub async fn scan(&self, dir: &DocumentHandle) -> Vec<DocumentInfo> {
        let entries = match self.store.list(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(%dir, error = %e, "backup directory unreadable, treating as empty");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter(|entry| {
                !entry.is_directory
                    && ArchiveKind::classify(&entry.name, entry.mime_type.as_deref()).is_some()
            })
            .collect()
    }
}
