use core_catalog::CatalogError;
use host_traits::HostError;
use thiserror::Error;

/// ENOSPC; `std::io::ErrorKind` has no stable variant for it yet.
const OUT_OF_SPACE_ERRNO: i32 = 28;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Destination ran out of space")]
    OutOfSpace,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Size mismatch: expected {expected} bytes, wrote {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Decode failure: {0}")]
    Decode(String),

    #[error("Backup cancelled")]
    Cancelled,

    #[error("A backup run is already writing to {directory}")]
    RunInProgress { directory: String },

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Host error: {0}")]
    Host(String),
}

impl From<std::io::Error> for BackupError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => BackupError::NotFound(e.to_string()),
            std::io::ErrorKind::PermissionDenied => BackupError::PermissionDenied(e.to_string()),
            _ if e.raw_os_error() == Some(OUT_OF_SPACE_ERRNO) => BackupError::OutOfSpace,
            _ => BackupError::Io(e.to_string()),
        }
    }
}

impl From<HostError> for BackupError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::NotFound(msg) => BackupError::NotFound(msg),
            HostError::PermissionDenied(msg) => BackupError::PermissionDenied(msg),
            HostError::Io(io) => BackupError::from(io),
            other => BackupError::Host(other.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for BackupError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => BackupError::from(io),
            other => BackupError::Decode(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
