//! Soft delete with declared on-delete policies
//!
//! Deleting a record flips its soft-delete flag instead of removing the row.
//! Before that, every inbound relation is evaluated: cascades deactivate
//! dependents recursively, set-null relations clear foreign keys, and protect
//! relations refuse the whole delete while any dependent exists. Each record's
//! delete, cascade included, is one storage transaction.

mod engine;
mod outcome;
mod plan;

pub use engine::SoftDeleteEngine;
pub use outcome::{BatchFailure, BatchReport, DeleteOutcome, Nullified, ProtectedDependent, RecordRef};
