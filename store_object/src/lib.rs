//! Store Object - core data-access layer for Vitrine
//!
//! Typed stores over soft-deletable tables, the relation registry that tells
//! the soft-delete engine what depends on what, the query builder, and the
//! storage backends (PostgreSQL and in-memory).

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod backend;
pub mod errors;
pub mod generic_store;
pub mod id_type;
pub mod prelude;
pub mod query_builder;
pub mod relation;
pub mod schema;
pub mod scope;
pub mod soft_delete;
pub mod traits;
pub mod validation;

pub use backend::{MemoryBackend, PgBackend, Row, StorageBackend, StorageTransaction};
pub use errors::StoreError;
pub use generic_store::GenericStore;
pub use id_type::{HasUniversalId, UniversalId};
pub use query_builder::{QueryBuilder, QueryFilter, QueryOperator, SortOrder};
pub use relation::{OnDelete, Relation};
pub use schema::{RelationRegistry, SharedRegistry, TableSchema, DEFAULT_SOFT_DELETE_FIELD};
pub use scope::QueryScope;
pub use soft_delete::{BatchFailure, BatchReport, DeleteOutcome, ProtectedDependent, SoftDeleteEngine};
pub use traits::*;
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

use sqlx::PgPool;

pub type DbPool = PgPool;
