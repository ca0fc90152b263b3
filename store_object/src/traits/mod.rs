//! Traits for database operations
//!
//! [`TableMetadata`] is what `#[model]` derives; [`StoreObject`] and
//! [`SoftDeletable`] are the typed operations a store offers over a model.

pub mod core;
pub mod soft_deletable;
pub mod table_metadata;

pub use core::StoreObject;
pub use soft_deletable::SoftDeletable;
pub use table_metadata::TableMetadata;
