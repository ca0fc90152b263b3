use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::SortOrder;
use crate::query_builder::sql_generation::SqlGenerator;
use crate::validation::ValidationError;
use serde_json::Value;

/// Query builder for constructing filtered, ordered and paged reads
///
/// Top-level filters are combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) conditions: Vec<QueryFilter>,
    pub(crate) order_by: Vec<(String, SortOrder)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions.push(filter);
        self
    }

    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.conditions.extend(filters);
        self
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn conditions(&self) -> &[QueryFilter] {
        &self.conditions
    }

    pub fn ordering(&self) -> &[(String, SortOrder)] {
        &self.order_by
    }

    /// Same filters, without ordering or paging (for counts)
    pub fn without_paging(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            ..Self::default()
        }
    }

    /// Build WHERE clause; parameters are typed through `table`'s row type
    pub fn build_where_clause(&self, table: &str) -> Result<(String, Vec<Value>), ValidationError> {
        SqlGenerator::build_where_clause(table, &self.conditions)
    }

    pub fn build_order_clause(&self) -> Result<String, ValidationError> {
        SqlGenerator::build_order_clause(&self.order_by)
    }

    pub fn build_limit_clause(&self) -> String {
        SqlGenerator::build_limit_clause(self.limit, self.offset)
    }

    /// Build complete query parts (WHERE, ORDER BY, LIMIT, Values)
    pub fn build(&self, table: &str) -> Result<(String, String, String, Vec<Value>), ValidationError> {
        let (where_clause, values) = self.build_where_clause(table)?;
        let order_clause = self.build_order_clause()?;
        let limit_clause = self.build_limit_clause();

        Ok((where_clause, order_clause, limit_clause, values))
    }
}
