use serde_json::Value;

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    ILike,     // ILIKE (case insensitive)
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Value>, // None for IS NULL/IS NOT NULL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    pub fn eq(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value))
    }

    pub fn ne(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value))
    }

    pub fn gt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value))
    }

    pub fn gte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value))
    }

    pub fn lt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value))
    }

    pub fn lte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value))
    }

    /// SQL `LIKE` pattern: `%` matches any run, `_` a single character
    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::Like,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::ILike,
            Some(Value::String(pattern.to_string())),
        )
    }

    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Value::Array(values)))
    }

    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Value::Array(values)))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }
}
