use crate::soft_delete::ProtectedDependent;
use std::fmt::Display;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{table} record {id} not found")]
    NotFound { table: String, id: String },

    #[error("cannot delete {table} {id}: blocked by {} protected dependent(s)", .dependents.len())]
    HasProtectedDependents {
        table: String,
        id: String,
        dependents: Vec<ProtectedDependent>,
    },

    #[error("storage failure during {operation} on {table}: {source}")]
    StorageFailure {
        table: String,
        operation: String,
        #[source]
        source: BoxError,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("validation failed for {table}.{field}: {message}")]
    Validation {
        table: String,
        field: String,
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl StoreError {
    pub fn not_found(table: &str, id: impl Display) -> Self {
        Self::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        }
    }

    pub fn storage(table: &str, operation: &str, source: impl Into<BoxError>) -> Self {
        Self::StorageFailure {
            table: table.to_string(),
            operation: operation.to_string(),
            source: source.into(),
        }
    }

    /// Shorthand for sqlx failures, the most common storage error source
    pub fn database_operation(table: &str, operation: &str, source: sqlx::Error) -> Self {
        Self::storage(table, operation, source)
    }

    pub fn validation(table: &str, field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            table: table.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Blocking dependents when this is a protected-delete refusal
    pub fn protected_dependents(&self) -> Option<&[ProtectedDependent]> {
        match self {
            Self::HasProtectedDependents { dependents, .. } => Some(dependents),
            _ => None,
        }
    }
}
