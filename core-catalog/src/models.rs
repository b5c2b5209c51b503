//! Archive record model and sorting.

use host_traits::documents::{DocumentHandle, DocumentInfo};
use host_traits::inspect::PackageMetadata;
use host_traits::settings::SortOrder;
use serde::{Deserialize, Serialize};

/// MIME type of a plain APK.
pub const APK_MIME_TYPE: &str = "application/vnd.android.package-archive";

/// Shape of an archive on disk, derived from name/MIME.
///
/// `.apks`/`.xapk` containers carry no registered MIME type, so the suffix is
/// authoritative for bundles and the MIME type only confirms plain APKs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveKind {
    /// One verbatim APK file.
    Apk,
    /// Zip container holding a primary APK entry plus split entries.
    Bundle,
}

impl ArchiveKind {
    /// Classify a document by display name and optional MIME type.
    /// Returns `None` for documents that are not recognized archives.
    pub fn classify(name: &str, mime_type: Option<&str>) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".apks") || lower.ends_with(".xapk") {
            return Some(ArchiveKind::Bundle);
        }
        if lower.ends_with(".apk") || mime_type == Some(APK_MIME_TYPE) {
            return Some(ArchiveKind::Apk);
        }
        None
    }
}

/// One known backup archive.
///
/// Identity is the document handle. `loaded == true` means metadata
/// extraction was attempted at least once; the enrichment fields may still
/// be `None` when that attempt failed. The loader never retries a loaded
/// record unless [`CatalogStore::force_refresh`](crate::store::CatalogStore::force_refresh)
/// clears the flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    pub handle: DocumentHandle,
    pub display_name: String,
    pub mime_type: Option<String>,
    /// Last-modified time (Unix epoch seconds).
    pub last_modified: i64,
    pub size_bytes: u64,

    // Enrichment fields, populated by the metadata loader.
    pub app_name: Option<String>,
    pub package_name: Option<String>,
    pub version_name: Option<String>,
    pub version_code: Option<i64>,
    pub min_sdk: Option<i32>,
    pub target_sdk: Option<i32>,
    /// Raw icon bytes (PNG).
    pub icon: Option<Vec<u8>>,

    /// Whether enrichment was attempted at least once.
    pub loaded: bool,
}

impl ArchiveRecord {
    /// Build an unloaded record from a directory listing entry.
    pub fn from_listing(info: &DocumentInfo) -> Self {
        Self {
            handle: info.handle.clone(),
            display_name: info.name.clone(),
            mime_type: info.mime_type.clone(),
            last_modified: info.modified_at,
            size_bytes: info.size,
            app_name: None,
            package_name: None,
            version_name: None,
            version_code: None,
            min_sdk: None,
            target_sdk: None,
            icon: None,
            loaded: false,
        }
    }

    /// Archive shape of this record.
    pub fn kind(&self) -> Option<ArchiveKind> {
        ArchiveKind::classify(&self.display_name, self.mime_type.as_deref())
    }

    /// Copy of this record enriched with parsed package metadata and marked
    /// as loaded.
    pub fn enriched(&self, metadata: PackageMetadata) -> Self {
        Self {
            app_name: metadata.app_name,
            package_name: metadata.package_name,
            version_name: metadata.version_name,
            version_code: metadata.version_code,
            min_sdk: metadata.min_sdk,
            target_sdk: metadata.target_sdk,
            icon: metadata.icon.map(|b| b.to_vec()),
            loaded: true,
            ..self.clone()
        }
    }

    /// Copy of this record with enrichment untouched but marked as attempted.
    pub fn attempted(&self) -> Self {
        Self {
            loaded: true,
            ..self.clone()
        }
    }
}

/// Sort records in place by the user's sort order.
///
/// Name comparisons are case-insensitive; ties fall back to the handle so
/// ordering is total and stable across calls.
pub fn sort_records(records: &mut [ArchiveRecord], order: SortOrder) {
    records.sort_by(|a, b| {
        let cmp = match order {
            SortOrder::NameAsc => a
                .display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase()),
            SortOrder::NameDesc => b
                .display_name
                .to_lowercase()
                .cmp(&a.display_name.to_lowercase()),
            SortOrder::SizeAsc => a.size_bytes.cmp(&b.size_bytes),
            SortOrder::SizeDesc => b.size_bytes.cmp(&a.size_bytes),
            SortOrder::ModifiedAsc => a.last_modified.cmp(&b.last_modified),
            SortOrder::ModifiedDesc => b.last_modified.cmp(&a.last_modified),
        };
        cmp.then_with(|| a.handle.cmp(&b.handle))
    });
}
