//! PostgreSQL rendering of [`QueryFilter`] trees
//!
//! Every parameter is bound as `jsonb` and converted to the column's declared
//! type through the table's own row type, so one binding path serves UUID,
//! numeric, text, boolean and timestamp columns alike.

use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::SortOrder;
use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
use serde_json::Value;

pub struct SqlGenerator;

impl SqlGenerator {
    /// `$index` (jsonb) converted to the type of `table.field`
    pub fn typed_param(table: &ValidatedTableName, field: &ValidatedFieldName, index: usize) -> String {
        format!(
            "(jsonb_populate_record(NULL::{}, jsonb_build_object('{}', ${}::jsonb))).{}",
            table.quoted(),
            field.as_str(),
            index,
            field.quoted()
        )
    }

    /// `$index` (a jsonb array) converted to an array of `table.field`'s type
    pub fn typed_array_param(
        table: &ValidatedTableName,
        field: &ValidatedFieldName,
        index: usize,
    ) -> String {
        format!(
            "ARRAY(SELECT (jsonb_populate_record(NULL::{}, jsonb_build_object('{}', e.value))).{} \
             FROM jsonb_array_elements(${}::jsonb) AS e(value))",
            table.quoted(),
            field.as_str(),
            field.quoted(),
            index
        )
    }

    /// Build WHERE clause from conditions; parameters are numbered from `$1`
    pub fn build_where_clause(
        table: &str,
        conditions: &[QueryFilter],
    ) -> Result<(String, Vec<Value>), ValidationError> {
        if conditions.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        let table = ValidatedTableName::new(table)?;
        let mut values = Vec::new();

        let conditions_sql = conditions
            .iter()
            .map(|condition| Self::build_condition_sql(&table, condition, &mut values))
            .collect::<Result<Vec<_>, _>>()?
            .join(" AND ");

        Ok((format!("WHERE {}", conditions_sql), values))
    }

    fn build_condition_sql(
        table: &ValidatedTableName,
        filter: &QueryFilter,
        values: &mut Vec<Value>,
    ) -> Result<String, ValidationError> {
        match filter {
            QueryFilter::Condition(condition) => {
                Self::build_single_condition_sql(table, condition, values)
            }
            QueryFilter::Group { operator, filters } => {
                if filters.is_empty() {
                    // Identity element of the connective
                    return Ok(match operator {
                        LogicalOperator::And => "TRUE".to_string(),
                        LogicalOperator::Or => "FALSE".to_string(),
                    });
                }

                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let group_conditions = filters
                    .iter()
                    .map(|f| Self::build_condition_sql(table, f, values))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(operator_str);

                Ok(format!("({})", group_conditions))
            }
        }
    }

    fn build_single_condition_sql(
        table: &ValidatedTableName,
        condition: &QueryCondition,
        values: &mut Vec<Value>,
    ) -> Result<String, ValidationError> {
        let field = ValidatedFieldName::new(&condition.field)?;
        let column = field.quoted();

        let mut push = |value: &Value| {
            values.push(value.clone());
            values.len()
        };

        let sql = match (&condition.operator, &condition.value) {
            (QueryOperator::IsNull, _) | (QueryOperator::Eq, None | Some(Value::Null)) => {
                format!("{} IS NULL", column)
            }
            (QueryOperator::IsNotNull, _) | (QueryOperator::Ne, None | Some(Value::Null)) => {
                format!("{} IS NOT NULL", column)
            }
            (QueryOperator::Like | QueryOperator::ILike, Some(value)) => {
                let keyword = if condition.operator == QueryOperator::Like {
                    "LIKE"
                } else {
                    "ILIKE"
                };
                let index = push(value);
                format!("{}::text {} (${}::jsonb #>> '{{}}')", column, keyword, index)
            }
            (QueryOperator::In, Some(Value::Array(items)))
            | (QueryOperator::NotIn, Some(Value::Array(items))) => {
                let negated = condition.operator == QueryOperator::NotIn;
                if items.is_empty() {
                    // Empty IN matches nothing, empty NOT IN matches everything
                    return Ok(if negated { "TRUE" } else { "FALSE" }.to_string());
                }

                let placeholders: Vec<String> = items
                    .iter()
                    .map(|item| Self::typed_param(table, &field, push(item)))
                    .collect();
                let keyword = if negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", column, keyword, placeholders.join(", "))
            }
            (operator, Some(value)) => {
                let symbol = match operator {
                    QueryOperator::Eq => "=",
                    QueryOperator::Ne => "!=",
                    QueryOperator::Gt => ">",
                    QueryOperator::Gte => ">=",
                    QueryOperator::Lt => "<",
                    QueryOperator::Lte => "<=",
                    // IN/NOT IN without an array operand
                    _ => return Ok("FALSE".to_string()),
                };
                let index = push(value);
                format!("{} {} {}", column, symbol, Self::typed_param(table, &field, index))
            }
            // Comparison without an operand
            (_, None) => "FALSE".to_string(),
        };

        Ok(sql)
    }

    pub fn build_order_clause(order_by: &[(String, SortOrder)]) -> Result<String, ValidationError> {
        if order_by.is_empty() {
            return Ok(String::new());
        }

        let order_items = order_by
            .iter()
            .map(|(field, order)| {
                ValidatedFieldName::new(field).map(|f| format!("{} {}", f.quoted(), order.to_sql()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("ORDER BY {}", order_items.join(", ")))
    }

    pub fn build_limit_clause(limit: Option<u64>, offset: Option<u64>) -> String {
        let mut clauses = Vec::new();

        if let Some(limit) = limit {
            clauses.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = offset {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }
}
