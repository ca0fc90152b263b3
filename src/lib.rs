//! # Vitrine
//!
//! A soft-delete repository layer for PostgreSQL. Every model carries a
//! boolean activity flag; deleting a record flips it and applies the on-delete
//! policy declared by each foreign key that points at the record:
//!
//! - `cascade` soft-deletes active dependents, recursively
//! - `set_null` clears the foreign key of active dependents
//! - `protect` refuses the whole delete while a dependent exists
//! - `ignore` leaves dependents untouched
//!
//! The whole traversal runs in one transaction. Default reads see active
//! records only; [`QueryScope`](store_object::QueryScope) opts into the rest.
//! The [`catalog`] module builds a small storefront on top.
//!
//! ## Quick Start
//!
//! ```rust
//! use vitrine::prelude::*;
//!
//! #[model]
//! #[table(name = "shelves")]
//! pub struct Shelf {
//!     #[primary_key]
//!     pub id: i64,
//!
//!     #[field(create, update)]
//!     pub title: String,
//!
//!     #[soft_delete]
//!     pub is_active: bool,
//! }
//!
//! #[model]
//! #[table(name = "books")]
//! pub struct Book {
//!     #[primary_key]
//!     pub id: i64,
//!
//!     #[field(create, update)]
//!     #[foreign_key(references = "shelves", on_delete = "cascade")]
//!     pub shelf_id: i64,
//!
//!     #[soft_delete]
//!     pub is_active: bool,
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let vitrine = Vitrine::in_memory();
//! vitrine.register::<Shelf>()?;
//! vitrine.register::<Book>()?;
//!
//! let shelves = vitrine.store::<Shelf>()?;
//! let books = vitrine.store::<Book>()?;
//! shelves.create(Shelf { id: 1, title: "Fiction".into(), is_active: true }).await?;
//! books.create(Book { id: 1, shelf_id: 1, is_active: true }).await?;
//!
//! let outcome = shelves.delete(&1).await?;
//! assert!(outcome.was_deactivated("books", &UniversalId::Numeric(1)));
//! assert!(books.get_by_id(&1).await?.is_none());
//! assert_eq!(books.list_inactive().await?.len(), 1);
//! # Ok::<(), VitrineError>(())
//! # }).unwrap();
//! ```

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

// Generated code names `::vitrine::...`, including inside this crate
extern crate self as vitrine;

pub mod catalog;
pub mod core;
pub mod errors;
pub mod migration;
pub mod prelude;

pub use core::Vitrine;
pub use errors::VitrineError;

pub use config::{AppConfig, ConfigError, DatabaseConfig, SignalConfig, SoftDeleteConfig};

// Paths used by `#[model]` and `#[derive(TableMetadata)]` expansions
pub use signal_system;
pub use store_object;
pub use table_derive;
pub use type_mapping;
pub use serde;

pub use async_trait;
pub use sqlx;
