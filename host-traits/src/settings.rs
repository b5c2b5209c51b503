//! Typed Settings Provider
//!
//! The engine consumes user preferences through this trait; it never owns or
//! writes them. Hosts back it with whatever preference storage they have
//! (DataStore on Android, an in-memory provider in the desktop test harness).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::documents::DocumentHandle;
use crate::error::Result;

/// Container suffix for multi-part archives. Exactly two values are
/// supported; both are plain zip underneath.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleSuffix {
    Apks,
    Xapk,
}

impl BundleSuffix {
    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            BundleSuffix::Apks => ".apks",
            BundleSuffix::Xapk => ".xapk",
        }
    }
}

impl Default for BundleSuffix {
    fn default() -> Self {
        BundleSuffix::Apks
    }
}

/// User-selected ordering for catalog listings and metadata-load scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
    ModifiedAsc,
    ModifiedDesc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::ModifiedDesc
    }
}

/// Read-only view of the backup-related user preferences.
#[async_trait]
pub trait BackupSettings: Send + Sync {
    /// The user-chosen backup directory, if one has been picked.
    async fn backup_directory(&self) -> Result<Option<DocumentHandle>>;

    /// Ordered naming attribute keys (see `core-backup`'s naming resolver).
    /// Unknown keys are ignored by the consumer.
    async fn name_attributes(&self) -> Result<Vec<String>>;

    /// Separator placed between naming attributes.
    async fn name_separator(&self) -> Result<String>;

    /// Whether split APKs are bundled with the primary into one container.
    async fn bundle_splits(&self) -> Result<bool>;

    /// Container suffix used when bundling.
    async fn bundle_suffix(&self) -> Result<BundleSuffix>;

    /// Catalog sort order.
    async fn sort_order(&self) -> Result<SortOrder>;

    /// Whether automatic backup on app update is enabled at all.
    async fn auto_backup_enabled(&self) -> Result<bool>;

    /// Package names tracked for automatic backup.
    async fn auto_backup_packages(&self) -> Result<HashSet<String>>;
}
