use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Invalid record: {field} - {message}")]
    InvalidRecord { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
