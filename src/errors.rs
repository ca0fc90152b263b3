//! Error types for the Vitrine crate

use config::ConfigError;
use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VitrineError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Table {0} is not registered")]
    SchemaNotRegistered(String),

    #[error("Operation {0} needs a PostgreSQL connection")]
    NotConnected(&'static str),
}

impl VitrineError {
    /// The underlying store error, if this is one
    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            VitrineError::Store(error) => Some(error),
            _ => None,
        }
    }
}
