//! Archive Readers
//!
//! Extract the primary APK payload out of an archive staged to a local file.
//! Both shapes funnel through one trait so the metadata loader stays agnostic
//! of how the payload is stored. All methods are blocking and expected to run
//! under `spawn_blocking`.

use std::io;
use std::path::Path;

use core_catalog::ArchiveKind;

use crate::error::{BackupError, Result};

/// Pulls the primary APK out of a staged archive file.
pub trait ArchiveReader: Send + Sync {
    /// Extract the primary APK payload of `archive` into `dest`.
    fn extract_primary(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Plain APK: the payload is the file itself.
pub struct ApkReader;

impl ArchiveReader for ApkReader {
    fn extract_primary(&self, archive: &Path, dest: &Path) -> Result<()> {
        std::fs::copy(archive, dest)?;
        Ok(())
    }
}

/// Zip bundle: the payload is the canonical base entry of the container.
pub struct BundleReader;

impl ArchiveReader for BundleReader {
    fn extract_primary(&self, archive: &Path, dest: &Path) -> Result<()> {
        let file = std::fs::File::open(archive)?;
        let mut container = zip::ZipArchive::new(file)?;

        let names: Vec<String> = container.file_names().map(str::to_owned).collect();
        tracing::debug!(entries = names.len(), archive = %archive.display(), "scanning bundle");
        let entry_name = canonical_entry(names.iter().map(String::as_str))
            .ok_or_else(|| BackupError::Decode("bundle contains no primary APK entry".into()))?
            .to_owned();

        let mut entry = container.by_name(&entry_name)?;
        let mut out = std::fs::File::create(dest)?;
        io::copy(&mut entry, &mut out)?;
        Ok(())
    }
}

/// Pick the canonical primary APK entry from a bundle's entry names:
/// `base.apk` when present, otherwise the first `.apk` entry that is not a
/// split (`split_` prefix).
pub fn canonical_entry<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut first_non_split = None;
    for name in names {
        if name.eq_ignore_ascii_case("base.apk") {
            return Some(name);
        }
        let file_name = name.rsplit('/').next().unwrap_or(name);
        if first_non_split.is_none()
            && file_name.to_ascii_lowercase().ends_with(".apk")
            && !file_name.to_ascii_lowercase().starts_with("split_")
        {
            first_non_split = Some(name);
        }
    }
    first_non_split
}

/// Reader for an archive shape.
pub fn reader_for(kind: ArchiveKind) -> &'static dyn ArchiveReader {
    static APK: ApkReader = ApkReader;
    static BUNDLE: BundleReader = BundleReader;
    match kind {
        ArchiveKind::Apk => &APK,
        ArchiveKind::Bundle => &BUNDLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_prefers_base_apk() {
        let names = ["split_config.arm64_v8a.apk", "base.apk", "other.apk"];
        assert_eq!(canonical_entry(names), Some("base.apk"));
    }

    #[test]
    fn canonical_falls_back_to_first_non_split() {
        let names = ["split_config.en.apk", "com.foo.apk", "extra.apk"];
        assert_eq!(canonical_entry(names), Some("com.foo.apk"));
    }

    #[test]
    fn canonical_rejects_split_only_bundles() {
        let names = ["split_config.en.apk", "split_config.arm64_v8a.apk"];
        assert_eq!(canonical_entry(names), None);
        assert_eq!(canonical_entry(["manifest.json"]), None);
    }
}
