//! Document store rooted at a local directory.

use async_trait::async_trait;
use host_traits::documents::{
    DocumentHandle, DocumentInfo, DocumentStore, DynDocumentRead, DynDocumentWrite,
};
use host_traits::error::{HostError, Result};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;
use tracing::debug;

const APK_MIME: &str = "application/vnd.android.package-archive";

/// Filesystem-backed document store.
///
/// Handles are absolute path strings. Any handle that resolves outside the
/// root is rejected with `PermissionDenied`, mirroring how a scoped-storage
/// host refuses handles from trees the user never granted.
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Handle addressing a path under this store's root.
    pub fn handle_for(&self, path: &Path) -> DocumentHandle {
        DocumentHandle::new(path.to_string_lossy().into_owned())
    }

    pub fn root_handle(&self) -> DocumentHandle {
        self.handle_for(&self.root)
    }

    fn resolve(&self, handle: &DocumentHandle) -> Result<PathBuf> {
        let path = PathBuf::from(handle.as_str());
        if !path.starts_with(&self.root) {
            return Err(HostError::PermissionDenied(handle.to_string()));
        }
        Ok(path)
    }

    async fn info_for(&self, path: &Path) -> Result<DocumentInfo> {
        let meta = fs::metadata(path).await.map_err(|e| map_io(e, path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified_at = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let mime_type = name
            .to_ascii_lowercase()
            .ends_with(".apk")
            .then(|| APK_MIME.to_string());

        Ok(DocumentInfo {
            handle: self.handle_for(path),
            name,
            mime_type,
            size: meta.len(),
            modified_at,
            is_directory: meta.is_dir(),
        })
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn list(&self, dir: &DocumentHandle) -> Result<Vec<DocumentInfo>> {
        let path = self.resolve(dir)?;
        let mut entries = fs::read_dir(&path).await.map_err(|e| map_io(e, &path))?;

        let mut infos = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| map_io(e, &path))? {
            infos.push(self.info_for(&entry.path()).await?);
        }
        Ok(infos)
    }

    async fn stat(&self, handle: &DocumentHandle) -> Result<DocumentInfo> {
        let path = self.resolve(handle)?;
        self.info_for(&path).await
    }

    async fn exists(&self, handle: &DocumentHandle) -> Result<bool> {
        let path = self.resolve(handle)?;
        Ok(fs::try_exists(&path).await.map_err(HostError::Io)?)
    }

    async fn create_document(
        &self,
        dir: &DocumentHandle,
        name: &str,
        _mime_type: &str,
    ) -> Result<DocumentHandle> {
        let dir_path = self.resolve(dir)?;
        fs::create_dir_all(&dir_path)
            .await
            .map_err(|e| map_io(e, &dir_path))?;

        let path = dir_path.join(name);
        fs::File::create(&path).await.map_err(|e| map_io(e, &path))?;
        debug!(path = %path.display(), "created document");
        Ok(self.handle_for(&path))
    }

    async fn open_read(&self, handle: &DocumentHandle) -> Result<Box<DynDocumentRead>> {
        let path = self.resolve(handle)?;
        let file = fs::File::open(&path).await.map_err(|e| map_io(e, &path))?;
        Ok(Box::new(file))
    }

    async fn open_write(&self, handle: &DocumentHandle) -> Result<Box<DynDocumentWrite>> {
        let path = self.resolve(handle)?;
        let file = fs::File::create(&path).await.map_err(|e| map_io(e, &path))?;
        Ok(Box::new(file))
    }

    async fn delete(&self, handle: &DocumentHandle) -> Result<()> {
        let path = self.resolve(handle)?;
        fs::remove_file(&path).await.map_err(|e| map_io(e, &path))
    }
}

fn map_io(e: std::io::Error, path: &Path) -> HostError {
    match e.kind() {
        std::io::ErrorKind::NotFound => HostError::NotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            HostError::PermissionDenied(path.display().to_string())
        }
        _ => HostError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_list_stat_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(tmp.path());
        let root = store.root_handle();

        let doc = store
            .create_document(&root, "a.apk", APK_MIME)
            .await
            .unwrap();
        assert!(store.exists(&doc).await.unwrap());

        let listing = store.list(&root).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "a.apk");
        assert_eq!(listing[0].mime_type.as_deref(), Some(APK_MIME));

        let info = store.stat(&doc).await.unwrap();
        assert_eq!(info.size, 0);
        assert!(!info.is_directory);

        store.delete(&doc).await.unwrap();
        assert!(!store.exists(&doc).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_handles_outside_root() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(tmp.path());

        let foreign = DocumentHandle::new("/etc/passwd");
        assert!(matches!(
            store.stat(&foreign).await,
            Err(HostError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(tmp.path());
        let ghost = store.handle_for(&tmp.path().join("ghost.apk"));

        assert!(matches!(
            store.open_read(&ghost).await,
            Err(HostError::NotFound(_))
        ));
    }
}
