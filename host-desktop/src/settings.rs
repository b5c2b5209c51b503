//! In-memory settings provider with setters, for the harness and tests.

use async_trait::async_trait;
use host_traits::documents::DocumentHandle;
use host_traits::error::Result;
use host_traits::settings::{BackupSettings, BundleSuffix, SortOrder};
use std::collections::HashSet;
use tokio::sync::RwLock;

struct Inner {
    backup_directory: Option<DocumentHandle>,
    name_attributes: Vec<String>,
    name_separator: String,
    bundle_splits: bool,
    bundle_suffix: BundleSuffix,
    sort_order: SortOrder,
    auto_backup_enabled: bool,
    auto_backup_packages: HashSet<String>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            backup_directory: None,
            name_attributes: vec!["name".to_string(), "version_name".to_string()],
            name_separator: "-".to_string(),
            bundle_splits: true,
            bundle_suffix: BundleSuffix::default(),
            sort_order: SortOrder::default(),
            auto_backup_enabled: false,
            auto_backup_packages: HashSet::new(),
        }
    }
}

/// Mutable in-memory [`BackupSettings`].
#[derive(Default)]
pub struct StaticSettings {
    inner: RwLock<Inner>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_backup_directory(&self, dir: Option<DocumentHandle>) {
        self.inner.write().await.backup_directory = dir;
    }

    pub async fn set_name_attributes(&self, attributes: Vec<String>) {
        self.inner.write().await.name_attributes = attributes;
    }

    pub async fn set_name_separator(&self, separator: impl Into<String>) {
        self.inner.write().await.name_separator = separator.into();
    }

    pub async fn set_bundle_splits(&self, enabled: bool) {
        self.inner.write().await.bundle_splits = enabled;
    }

    pub async fn set_bundle_suffix(&self, suffix: BundleSuffix) {
        self.inner.write().await.bundle_suffix = suffix;
    }

    pub async fn set_sort_order(&self, order: SortOrder) {
        self.inner.write().await.sort_order = order;
    }

    pub async fn set_auto_backup_enabled(&self, enabled: bool) {
        self.inner.write().await.auto_backup_enabled = enabled;
    }

    pub async fn track_package(&self, package_name: impl Into<String>) {
        self.inner
            .write()
            .await
            .auto_backup_packages
            .insert(package_name.into());
    }

    pub async fn untrack_package(&self, package_name: &str) {
        self.inner
            .write()
            .await
            .auto_backup_packages
            .remove(package_name);
    }
}

#[async_trait]
impl BackupSettings for StaticSettings {
    async fn backup_directory(&self) -> Result<Option<DocumentHandle>> {
        Ok(self.inner.read().await.backup_directory.clone())
    }

    async fn name_attributes(&self) -> Result<Vec<String>> {
        Ok(self.inner.read().await.name_attributes.clone())
    }

    async fn name_separator(&self) -> Result<String> {
        Ok(self.inner.read().await.name_separator.clone())
    }

    async fn bundle_splits(&self) -> Result<bool> {
        Ok(self.inner.read().await.bundle_splits)
    }

    async fn bundle_suffix(&self) -> Result<BundleSuffix> {
        Ok(self.inner.read().await.bundle_suffix)
    }

    async fn sort_order(&self) -> Result<SortOrder> {
        Ok(self.inner.read().await.sort_order)
    }

    async fn auto_backup_enabled(&self) -> Result<bool> {
        Ok(self.inner.read().await.auto_backup_enabled)
    }

    async fn auto_backup_packages(&self) -> Result<HashSet<String>> {
        Ok(self.inner.read().await.auto_backup_packages.clone())
    }
}
