//! Convenience re-exports for common store-object usage

// Core traits
pub use crate::traits::{SoftDeletable, StoreObject, TableMetadata};

// Error types
pub use crate::errors::StoreError;

// Core store functionality
pub use crate::generic_store::GenericStore;
pub use crate::soft_delete::{BatchReport, DeleteOutcome, ProtectedDependent};

// Relations and scopes
pub use crate::relation::{OnDelete, Relation};
pub use crate::scope::QueryScope;

pub use crate::id_type::{HasUniversalId, UniversalId};

// Query building
pub use crate::query_builder::{QueryBuilder, QueryFilter, SortOrder};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use uuid::Uuid;
