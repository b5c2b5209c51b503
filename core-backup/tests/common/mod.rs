//! Shared harness for the backup engine integration tests.
//!
//! Fake APKs are text files of `key=value` pairs; [`StubInspector`] parses
//! them the way a host package manager would parse a real binary manifest.

#![allow(dead_code)]

use async_trait::async_trait;
use core_backup::{ArchiveWriter, BackupOrchestrator, MetadataLoader, Synchronizer};
use core_backup::scanner::DirectoryScanner;
use core_catalog::db::create_test_pool;
use core_catalog::CatalogStore;
use core_runtime::events::{BackupEvent, EventBus};
use host_desktop::{FsDocumentStore, StaticSettings};
use host_traits::apps::InstalledApp;
use host_traits::documents::DocumentHandle;
use host_traits::error::{HostError, Result as HostResult};
use host_traits::inspect::{PackageInspector, PackageMetadata};
use host_traits::settings::BackupSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

/// Parses the fake text-APK format: `pkg=..;name=..;vn=..;vc=..`.
pub struct StubInspector;

#[async_trait]
impl PackageInspector for StubInspector {
    async fn inspect(&self, apk_path: &Path) -> HostResult<PackageMetadata> {
        let text = tokio::fs::read_to_string(apk_path)
            .await
            .map_err(HostError::Io)?;
        parse_fake_apk(&text)
            .ok_or_else(|| HostError::OperationFailed("unparseable package".into()))
    }
}

fn parse_fake_apk(text: &str) -> Option<PackageMetadata> {
    let mut meta = PackageMetadata::default();
    let mut has_package = false;
    for pair in text.trim().split(';') {
        let (key, value) = pair.split_once('=')?;
        match key {
            "pkg" => {
                meta.package_name = Some(value.to_string());
                has_package = true;
            }
            "name" => meta.app_name = Some(value.to_string()),
            "vn" => meta.version_name = Some(value.to_string()),
            "vc" => meta.version_code = value.parse().ok(),
            _ => {}
        }
    }
    has_package.then_some(meta)
}

/// Body of a fake APK file the [`StubInspector`] can parse.
pub fn apk_body(package: &str, display_name: &str, version: &str, code: i64) -> String {
    format!("pkg={package};name={display_name};vn={version};vc={code}")
}

/// Write the source files of an app and return its snapshot.
pub async fn installed_app(
    sources: &Path,
    package: &str,
    display_name: &str,
    split_count: usize,
) -> InstalledApp {
    let primary = sources.join(format!("{package}-base.apk"));
    tokio::fs::write(&primary, apk_body(package, display_name, "1.0", 1))
        .await
        .unwrap();

    let mut split_sources = Vec::new();
    for i in 0..split_count {
        let split = sources.join(format!("split_config.part{i}.apk"));
        tokio::fs::write(&split, format!("split payload {i}"))
            .await
            .unwrap();
        split_sources.push(split);
    }

    InstalledApp {
        package_name: package.to_string(),
        display_name: display_name.to_string(),
        primary_source: primary,
        split_sources,
        version_name: Some("1.0".to_string()),
        version_code: 1,
        icon: None,
        system: false,
        installed_at: 1_700_000_000,
        updated_at: 1_700_000_100,
    }
}

pub struct Harness {
    pub tmp: TempDir,
    pub store: Arc<FsDocumentStore>,
    pub settings: Arc<StaticSettings>,
    pub catalog: Arc<CatalogStore>,
    pub events: Arc<EventBus>,
    pub backup_dir: DocumentHandle,
    pub sources_dir: PathBuf,
    pub staging_dir: PathBuf,
}

impl Harness {
    pub async fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let backup_path = tmp.path().join("Backups");
        let sources_dir = tmp.path().join("sources");
        let staging_dir = tmp.path().join("staging");
        tokio::fs::create_dir_all(&backup_path).await.unwrap();
        tokio::fs::create_dir_all(&sources_dir).await.unwrap();

        let store = Arc::new(FsDocumentStore::new(tmp.path()));
        let backup_dir = store.handle_for(&backup_path);

        let settings = Arc::new(StaticSettings::new());
        settings.set_backup_directory(Some(backup_dir.clone())).await;

        let events = Arc::new(EventBus::default());
        let pool = create_test_pool().await.unwrap();
        let catalog = Arc::new(CatalogStore::open(pool, Arc::clone(&events)).await.unwrap());

        Self {
            tmp,
            store,
            settings,
            catalog,
            events,
            backup_dir,
            sources_dir,
            staging_dir,
        }
    }

    pub fn writer(&self) -> ArchiveWriter {
        ArchiveWriter::new(self.doc_store(), &self.staging_dir)
    }

    pub fn orchestrator(&self) -> BackupOrchestrator {
        BackupOrchestrator::new(
            self.doc_store(),
            self.writer(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.settings) as Arc<dyn BackupSettings>,
            Arc::clone(&self.events),
        )
    }

    pub fn synchronizer(&self) -> Synchronizer {
        let loader = MetadataLoader::new(
            self.doc_store(),
            Arc::new(StubInspector),
            &self.staging_dir,
        );
        Synchronizer::new(
            DirectoryScanner::new(self.doc_store()),
            Arc::clone(&self.catalog),
            loader,
            Arc::clone(&self.settings) as Arc<dyn BackupSettings>,
            Arc::clone(&self.events),
        )
    }

    pub fn doc_store(&self) -> Arc<dyn host_traits::documents::DocumentStore> {
        Arc::clone(&self.store) as Arc<dyn host_traits::documents::DocumentStore>
    }

    pub fn backup_path(&self) -> PathBuf {
        self.tmp.path().join("Backups")
    }

    /// Drop a fake archive file straight into the backup directory.
    pub async fn seed_archive(&self, name: &str, body: &str) -> DocumentHandle {
        let path = self.backup_path().join(name);
        tokio::fs::write(&path, body).await.unwrap();
        self.store.handle_for(&path)
    }

    pub async fn backup_dir_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.backup_path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Drain a run's event stream until it closes.
pub async fn collect_events(mut rx: UnboundedReceiver<BackupEvent>) -> Vec<BackupEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
