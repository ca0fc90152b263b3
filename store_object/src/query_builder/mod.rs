//! Query builder utilities
//!
//! Filters, ordering and paging shared by both storage backends: rendered to
//! SQL for PostgreSQL and evaluated in-process for the memory backend.

pub mod builder;
pub mod filter;
pub mod matching;
pub mod ordering;
pub mod sql_generation;


pub use builder::QueryBuilder;
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use ordering::SortOrder;
pub use sql_generation::SqlGenerator;
