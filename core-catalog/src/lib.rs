//! # Archive Catalog Module
//!
//! Owns the persisted catalog of backup archives and provides the observable
//! store the rest of the engine mutates through.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and migrations for archive records
//! - The [`CatalogStore`](store::CatalogStore): snapshot reads, upsert /
//!   remove / batch mutations, change observation
//! - Sorting of records by the user's sort order

pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use error::{CatalogError, Result};
pub use models::{sort_records, ArchiveKind, ArchiveRecord, APK_MIME_TYPE};
pub use store::{CatalogBatch, CatalogStore};
