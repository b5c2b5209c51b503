//! Backup Orchestrator
//!
//! Drives one backup run over a selection of installed apps. The caller gets
//! an event stream back immediately; the work itself runs on a spawned task.
//!
//! Runs are fail-fast: the first app that fails ends the run, later apps are
//! not attempted. At most one run may write into a given destination
//! directory at a time; a second `run` against the same directory is rejected
//! up front with [`BackupError::RunInProgress`].

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use core_catalog::{ArchiveRecord, CatalogStore};
use core_runtime::events::{BackupEvent, CoreEvent, EventBus};
use host_traits::apps::InstalledApp;
use host_traits::documents::{DocumentHandle, DocumentInfo, DocumentStore};
use host_traits::settings::{BackupSettings, BundleSuffix};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::archive::{ArchivePart, ArchiveWriter, PartProgress};
use crate::error::{BackupError, Result};
use crate::naming::{resolve_name, unique_name};
use crate::scanner::DirectoryScanner;

/// Lease on a destination directory; dropping it releases the directory.
pub type DirectoryLease = tokio::sync::OwnedMutexGuard<()>;

/// Single-flight guard keyed by destination directory handle.
#[derive(Default)]
pub struct DirectoryGuard {
    locks: std::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DirectoryGuard {
    /// Claim `dir` for one run, failing fast when it is already claimed.
    pub fn acquire(&self, dir: &DocumentHandle) -> Result<DirectoryLease> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(locks.entry(dir.to_string()).or_default())
        };
        lock.try_lock_owned().map_err(|_| BackupError::RunInProgress {
            directory: dir.to_string(),
        })
    }
}

/// Settings resolved once at the start of a run; mid-run preference changes
/// do not affect it.
struct RunPlan {
    dir: DocumentHandle,
    attributes: Vec<String>,
    separator: String,
    bundle_splits: bool,
    suffix: BundleSuffix,
}

#[derive(Clone)]
pub struct BackupOrchestrator {
    store: Arc<dyn DocumentStore>,
    writer: ArchiveWriter,
    scanner: DirectoryScanner,
    catalog: Arc<CatalogStore>,
    settings: Arc<dyn BackupSettings>,
    events: Arc<EventBus>,
    guard: Arc<DirectoryGuard>,
}

impl BackupOrchestrator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        writer: ArchiveWriter,
        catalog: Arc<CatalogStore>,
        settings: Arc<dyn BackupSettings>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            scanner: DirectoryScanner::new(Arc::clone(&store)),
            store,
            writer,
            catalog,
            settings,
            events,
            guard: Arc::new(DirectoryGuard::default()),
        }
    }

    /// Start a backup run over `apps` and return its event stream.
    ///
    /// The stream carries one `Started`, per-part `Progress`, and exactly one
    /// terminal event. Fails immediately when no backup directory is
    /// configured or a run already owns the directory.
    pub async fn run(
        &self,
        apps: Vec<InstalledApp>,
        cancel: CancellationToken,
    ) -> Result<UnboundedReceiver<BackupEvent>> {
        let plan = self.plan().await?;
        let lease = self.guard.acquire(&plan.dir)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let this = self.clone();
        tokio::spawn(async move {
            let _lease = lease;
            this.run_inner(plan, apps, cancel, tx).await;
        });
        Ok(rx)
    }

    async fn plan(&self) -> Result<RunPlan> {
        let dir = self
            .settings
            .backup_directory()
            .await
            .map_err(BackupError::from)?
            .ok_or_else(|| BackupError::NotConfigured("no backup directory selected".into()))?;
        Ok(RunPlan {
            dir,
            attributes: self.settings.name_attributes().await.map_err(BackupError::from)?,
            separator: self.settings.name_separator().await.map_err(BackupError::from)?,
            bundle_splits: self.settings.bundle_splits().await.map_err(BackupError::from)?,
            suffix: self.settings.bundle_suffix().await.map_err(BackupError::from)?,
        })
    }

    async fn run_inner(
        &self,
        plan: RunPlan,
        apps: Vec<InstalledApp>,
        cancel: CancellationToken,
        tx: UnboundedSender<BackupEvent>,
    ) {
        if apps.is_empty() {
            self.emit(&tx, BackupEvent::Empty);
            return;
        }

        info!(total = apps.len(), dir = %plan.dir, "backup run started");
        self.emit(
            &tx,
            BackupEvent::Started {
                total_apps: apps.len() as u64,
            },
        );

        let mut taken: HashSet<String> = self
            .scanner
            .scan(&plan.dir)
            .await
            .iter()
            .map(|info: &DocumentInfo| stem(&info.name))
            .collect();

        let mut produced: Vec<(String, DocumentHandle)> = Vec::with_capacity(apps.len());
        for app in &apps {
            if cancel.is_cancelled() {
                self.emit(
                    &tx,
                    BackupEvent::Failed {
                        package: app.package_name.clone(),
                        message: BackupError::Cancelled.to_string(),
                    },
                );
                return;
            }

            match self.backup_one(&plan, app, &mut taken, &tx).await {
                Ok(handle) => produced.push((app.package_name.clone(), handle)),
                Err(e) => {
                    warn!(package = %app.package_name, error = %e, "backup failed");
                    self.emit(
                        &tx,
                        BackupEvent::Failed {
                            package: app.package_name.clone(),
                            message: e.to_string(),
                        },
                    );
                    return;
                }
            }
        }

        let terminal = match produced.as_slice() {
            [(package, handle)] if apps.len() == 1 => BackupEvent::Completed {
                package: package.clone(),
                handle: handle.to_string(),
            },
            _ => BackupEvent::BatchCompleted {
                count: produced.len() as u64,
            },
        };
        self.emit(&tx, terminal);
    }

    async fn backup_one(
        &self,
        plan: &RunPlan,
        app: &InstalledApp,
        taken: &mut HashSet<String>,
        tx: &UnboundedSender<BackupEvent>,
    ) -> Result<DocumentHandle> {
        let include_splits = plan.bundle_splits && app.has_splits();
        let parts = build_parts(app, include_splits).await?;

        let base = resolve_name(app, &plan.attributes, &plan.separator);
        let base = unique_name(&base, taken);

        let progress_tx = tx.clone();
        let package = app.package_name.clone();
        let on_part: PartProgress = Arc::new(move |parts_completed| {
            let _ = progress_tx.send(BackupEvent::Progress {
                package: package.clone(),
                parts_completed,
            });
        });

        let handle = self
            .writer
            .write(&parts, &plan.dir, &base, include_splits, plan.suffix, on_part)
            .await?;
        taken.insert(base);

        // The app snapshot already carries everything enrichment would parse
        // back out; register the record loaded so the next sync pass skips it.
        let info = self.store.stat(&handle).await.map_err(BackupError::from)?;
        self.catalog.upsert(record_for(app, &info)).await?;
        Ok(handle)
    }

    fn emit(&self, tx: &UnboundedSender<BackupEvent>, event: BackupEvent) {
        self.events.emit(CoreEvent::Backup(event.clone())).ok();
        let _ = tx.send(event);
    }
}

/// Plan the parts of one app's archive, resolving source sizes up front.
async fn build_parts(app: &InstalledApp, include_splits: bool) -> Result<Vec<ArchivePart>> {
    let mut parts = Vec::with_capacity(1 + app.split_sources.len());
    parts.push(part_for(&app.primary_source, "base.apk".to_string()).await?);

    if include_splits {
        for (i, source) in app.split_sources.iter().enumerate() {
            let entry_name = source
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("split_{i}.apk"));
            parts.push(part_for(source, entry_name).await?);
        }
    }
    Ok(parts)
}

async fn part_for(source: &Path, entry_name: String) -> Result<ArchivePart> {
    let meta = tokio::fs::metadata(source).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BackupError::NotFound(source.display().to_string())
        } else {
            BackupError::from(e)
        }
    })?;
    Ok(ArchivePart {
        entry_name,
        source: source.to_path_buf(),
        expected_size: meta.len(),
    })
}

fn record_for(app: &InstalledApp, info: &DocumentInfo) -> ArchiveRecord {
    let mut record = ArchiveRecord::from_listing(info);
    record.app_name = Some(app.display_name.clone());
    record.package_name = Some(app.package_name.clone());
    record.version_name = app.version_name.clone();
    record.version_code = Some(app.version_code);
    record.icon = app.icon.as_ref().map(|b| b.to_vec());
    record.loaded = true;
    record
}

/// Base name of an archive file, known suffixes stripped.
fn stem(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    for suffix in [".apks", ".xapk", ".apk"] {
        if lower.ends_with(suffix) {
            return name[..name.len() - suffix.len()].to_string();
        }
    }
    name.to_string()
}
