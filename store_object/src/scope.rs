//! Read scopes over soft-deletable tables

use crate::query_builder::{QueryBuilder, QueryFilter};
use crate::schema::TableSchema;
use serde_json::Value;

/// Which records a read can see; `Active` unless a caller asks otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryScope {
    #[default]
    Active,
    Inactive,
    /// Unscoped: active and soft-deleted records alike
    All,
}

impl QueryScope {
    /// Required value of the soft-delete flag, if any
    pub fn flag(&self) -> Option<bool> {
        match self {
            QueryScope::Active => Some(true),
            QueryScope::Inactive => Some(false),
            QueryScope::All => None,
        }
    }

    pub fn admits(&self, is_active: bool) -> bool {
        self.flag().is_none_or(|flag| flag == is_active)
    }

    /// Add the soft-delete predicate for `schema` to `query`
    pub fn apply(&self, schema: &TableSchema, query: QueryBuilder) -> QueryBuilder {
        match self.flag() {
            Some(flag) => query.filter(QueryFilter::eq(schema.soft_delete_field, Value::Bool(flag))),
            None => query,
        }
    }
}
