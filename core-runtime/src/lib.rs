//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the engine crates:
//! - Event bus system (typed broadcast events)
//! - Logging and tracing bootstrap
//!
//! This crate establishes the logging conventions and event broadcasting
//! mechanisms used throughout the system.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{BackupEvent, CatalogEvent, CoreEvent, EventBus, SyncRunEvent};
