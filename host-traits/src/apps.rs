//! Installed Application Registry
//!
//! Read-only snapshot view of the applications installed on the host. The
//! browse/filter/sort listing subsystem owns this data; the engine only asks
//! for sources to copy and identity to stamp onto archive records.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::Result;

/// Snapshot of one installed application.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledApp {
    pub package_name: String,
    pub display_name: String,
    /// Path of the primary (base) APK on the host filesystem.
    pub primary_source: PathBuf,
    /// Paths of split APKs, empty when the app has none.
    pub split_sources: Vec<PathBuf>,
    pub version_name: Option<String>,
    pub version_code: i64,
    /// Raw icon bytes (PNG), when the host exposes them.
    pub icon: Option<Bytes>,
    pub system: bool,
    /// First-install time (Unix epoch seconds).
    pub installed_at: i64,
    /// Last-update time (Unix epoch seconds).
    pub updated_at: i64,
}

impl InstalledApp {
    /// All APK sources of this app, primary first.
    pub fn sources(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.primary_source).chain(self.split_sources.iter())
    }

    pub fn has_splits(&self) -> bool {
        !self.split_sources.is_empty()
    }
}

/// Read access to the host's installed-application list.
#[async_trait]
pub trait AppRegistry: Send + Sync {
    /// Look up one app by package name. `Ok(None)` when not installed.
    async fn get(&self, package_name: &str) -> Result<Option<InstalledApp>>;

    /// Bulk filter: which of the given packages are currently installed.
    async fn filter_installed(&self, package_names: &[String]) -> Result<Vec<String>>;
}
