//! # Backup Engine
//!
//! Produces on-disk backup archives of installed applications and keeps the
//! persisted archive catalog synchronized with the user-chosen backup
//! directory.
//!
//! ## Overview
//!
//! - [`archive`] - writing archives (verbatim APK or zip bundle) and reading
//!   the primary APK payload back out of them
//! - [`naming`] - attribute-list destination naming, pure
//! - [`scanner`] - directory listing filtered to recognized archives,
//!   degrading to empty on revoked access
//! - [`sync`] - set-diff reconciliation between filesystem and catalog
//! - [`loader`] - metadata enrichment through the host package inspector
//! - [`orchestrator`] - manual multi-app backup runs with a progress stream
//! - [`autobackup`] - automatic single-app backup on package-update events
//!
//! All I/O runs on background tasks; progress and results are delivered
//! back over channels and the shared [`EventBus`](core_runtime::EventBus).

pub mod archive;
pub mod autobackup;
pub mod error;
pub mod loader;
pub mod naming;
pub mod orchestrator;
pub mod scanner;
pub mod sync;

pub use archive::{ArchivePart, ArchiveWriter, PartProgress};
pub use autobackup::{AutoBackupTrigger, CompletionToken, PackageUpdated};
pub use error::{BackupError, Result};
pub use loader::MetadataLoader;
pub use naming::resolve_name;
pub use orchestrator::{BackupOrchestrator, DirectoryGuard};
pub use scanner::DirectoryScanner;
pub use sync::{SyncStats, Synchronizer};
