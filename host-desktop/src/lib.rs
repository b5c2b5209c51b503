//! # Desktop Host Implementations
//!
//! Implementations of the host traits for desktop platforms, used by the
//! development harness and the integration test suites.
//!
//! ## Overview
//!
//! - [`FsDocumentStore`] - document access rooted at a directory, handles are
//!   absolute paths scoped to that root
//! - [`StaticSettings`] - in-memory settings provider with setters
//! - [`StaticAppRegistry`] - in-memory installed-app registry
//! - [`RecordingNotifier`] - notification sink that records descriptors
//!
//! None of these talk to a real package manager; desktop is a harness, not a
//! production host.

mod apps;
mod documents;
mod notify;
mod settings;

pub use apps::StaticAppRegistry;
pub use documents::FsDocumentStore;
pub use notify::RecordingNotifier;
pub use settings::StaticSettings;

use std::path::PathBuf;

/// Default staging directory for archive packing and metadata extraction.
pub fn default_staging_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("apkstash")
        .join("staging")
}
