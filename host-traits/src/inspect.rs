//! Package Inspection
//!
//! Extracting identity/version/icon from a plain APK is a host capability
//! (the package manager parses the binary manifest). The engine stages the
//! APK into a temporary file and hands the path to this trait.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// Metadata parsed from one plain APK file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackageMetadata {
    pub app_name: Option<String>,
    pub package_name: Option<String>,
    pub version_name: Option<String>,
    pub version_code: Option<i64>,
    pub min_sdk: Option<i32>,
    pub target_sdk: Option<i32>,
    /// Raw icon bytes (PNG), when available.
    pub icon: Option<Bytes>,
}

/// Host-supplied APK parser.
///
/// A failed parse is reported as an error; the caller decides whether that
/// is fatal (the metadata loader treats it as a soft decode failure).
#[async_trait]
pub trait PackageInspector: Send + Sync {
    async fn inspect(&self, apk_path: &Path) -> Result<PackageMetadata>;
}
