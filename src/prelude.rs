//! Convenience re-exports for common Vitrine usage
//!
//! ```rust
//! use vitrine::prelude::*;
//!
//! let vitrine = Vitrine::in_memory();
//! assert!(vitrine.pool().is_none());
//! ```

// Core components
pub use crate::core::Vitrine;
pub use crate::errors::VitrineError;
pub use crate::catalog::Catalog;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, SignalConfig, SoftDeleteConfig};

// Store traits, policies, scopes and queries
pub use store_object::prelude::*;

// Event handling
pub use signal_system::prelude::*;

// Model derive
pub use table_derive::{model, TableMetadata};

// Common external dependencies
pub use anyhow;
pub use chrono::{DateTime, Utc};
pub use sqlx;
pub use tokio;
