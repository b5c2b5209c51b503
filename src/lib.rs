//! Workspace umbrella crate.
//!
//! Exposes feature flags that map to the individual workspace crates so host
//! applications can depend on `apkstash` and enable the documented features
//! without wiring each crate individually.
//!
//! - `engine` (default): the backup engine (`core-backup`) and the archive
//!   catalog (`core-catalog`).
//! - `desktop-shims`: additionally pulls in the native `host-desktop`
//!   implementations of the platform seam traits, useful for tests and
//!   desktop tooling.

pub use host_traits;

#[cfg(feature = "engine")]
pub use core_backup;
#[cfg(feature = "engine")]
pub use core_catalog;
#[cfg(feature = "engine")]
pub use core_runtime;
#[cfg(feature = "desktop-shims")]
pub use host_desktop;
