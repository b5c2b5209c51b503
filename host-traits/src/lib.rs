//! # Host Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the backup engine and the
//! platform-specific collaborators it depends on. Each trait represents a
//! capability the engine requires but that is implemented differently per
//! host (Android, desktop test harness):
//!
//! - [`DocumentStore`](documents::DocumentStore) - permission-scoped file
//!   access addressed through opaque [`DocumentHandle`](documents::DocumentHandle)s
//! - [`BackupSettings`](settings::BackupSettings) - typed user preferences
//!   (backup directory, naming scheme, bundling, tracking set)
//! - [`AppRegistry`](apps::AppRegistry) - read-only view of installed
//!   applications and their APK sources
//! - [`PackageInspector`](inspect::PackageInspector) - APK identity/version/
//!   icon extraction, supplied by the host package manager
//! - [`Notifier`](notify::Notifier) - completion notifications with
//!   follow-up actions
//!
//! ## Error Handling
//!
//! All traits use [`HostError`](error::HostError). Implementations convert
//! platform-specific errors and preserve the not-found / permission-denied
//! distinction, which the engine relies on for its degrade-to-empty and
//! cleanup policies.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; implementations are shared across
//! async tasks behind `Arc`.

pub mod apps;
pub mod documents;
pub mod error;
pub mod inspect;
pub mod notify;
pub mod settings;

pub use error::HostError;

// Re-export commonly used types
pub use apps::{AppRegistry, InstalledApp};
pub use documents::{DocumentHandle, DocumentInfo, DocumentStore};
pub use inspect::{PackageInspector, PackageMetadata};
pub use notify::{NotificationAction, NotificationDescriptor, NotificationIds, Notifier};
pub use settings::{BackupSettings, BundleSuffix, SortOrder};
