//! Document Store Abstraction
//!
//! Provides the permission-scoped filesystem boundary. Every file the engine
//! touches in the user-chosen backup directory is addressed through an opaque
//! [`DocumentHandle`] rather than a raw path:
//!
//! - Android: Storage Access Framework document URIs
//! - Desktop test harness: absolute paths rooted at a directory
//!
//! Handles survive process restarts and are the identity of catalog records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Opaque, permission-scoped reference to a file or directory.
///
/// The wrapped string is meaningful only to the [`DocumentStore`] that issued
/// it; the engine never interprets it beyond equality and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentHandle {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

/// Lightweight listing record for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub handle: DocumentHandle,
    /// Display name including extension, e.g. `com.foo-1.2.apk`.
    pub name: String,
    /// MIME type as reported by the host, if any.
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified time (Unix epoch seconds).
    pub modified_at: i64,
    pub is_directory: bool,
}

/// Dynamic async reader handed out by [`DocumentStore::open_read`].
pub type DynDocumentRead = dyn tokio::io::AsyncRead + Send + Unpin;

/// Dynamic async writer handed out by [`DocumentStore::open_write`].
pub type DynDocumentWrite = dyn tokio::io::AsyncWrite + Send + Unpin;

/// Permission-scoped document access.
///
/// Implementations map handles to whatever the platform uses underneath
/// (SAF URIs, sandboxed paths). All operations may fail with
/// [`HostError::PermissionDenied`](crate::HostError::PermissionDenied)
/// when the user has revoked access to the tree containing the handle;
/// callers decide whether that is fatal.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List the direct children of a directory handle.
    async fn list(&self, dir: &DocumentHandle) -> Result<Vec<DocumentInfo>>;

    /// Resolve current metadata for a handle.
    async fn stat(&self, handle: &DocumentHandle) -> Result<DocumentInfo>;

    /// Whether the handle still resolves to an existing document.
    async fn exists(&self, handle: &DocumentHandle) -> Result<bool>;

    /// Create a new (empty) document inside `dir` and return its handle.
    async fn create_document(
        &self,
        dir: &DocumentHandle,
        name: &str,
        mime_type: &str,
    ) -> Result<DocumentHandle>;

    /// Open a document for streaming reads.
    async fn open_read(&self, handle: &DocumentHandle) -> Result<Box<DynDocumentRead>>;

    /// Open a document for streaming writes, truncating existing content.
    async fn open_write(&self, handle: &DocumentHandle) -> Result<Box<DynDocumentWrite>>;

    /// Delete a document. Deleting an already-missing document is an error;
    /// callers that want tolerant cleanup check [`exists`](Self::exists) first
    /// or ignore `NotFound`.
    async fn delete(&self, handle: &DocumentHandle) -> Result<()>;
}
