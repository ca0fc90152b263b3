//! In-process evaluation of queries against JSON rows
//!
//! Mirrors the SQL semantics closely enough for the memory backend: comparisons
//! with NULL are false, NULLs sort last ascending and first descending, and
//! `LIKE` patterns use `%` and `_`.

use crate::backend::Row;
use crate::query_builder::builder::QueryBuilder;
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::SortOrder;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

impl QueryFilter {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            QueryFilter::Condition(condition) => condition.matches(row),
            QueryFilter::Group { operator, filters } => match operator {
                LogicalOperator::And => filters.iter().all(|f| f.matches(row)),
                LogicalOperator::Or => filters.iter().any(|f| f.matches(row)),
            },
        }
    }
}

impl QueryCondition {
    pub fn matches(&self, row: &Row) -> bool {
        let actual = row.get(&self.field).unwrap_or(&Value::Null);

        match (&self.operator, &self.value) {
            (QueryOperator::IsNull, _) | (QueryOperator::Eq, None | Some(Value::Null)) => {
                actual.is_null()
            }
            (QueryOperator::IsNotNull, _) | (QueryOperator::Ne, None | Some(Value::Null)) => {
                !actual.is_null()
            }
            (_, _) if actual.is_null() => false,
            (QueryOperator::Eq, Some(expected)) => {
                compare_values(actual, expected) == Some(Ordering::Equal)
            }
            (QueryOperator::Ne, Some(expected)) => {
                compare_values(actual, expected).is_some_and(|o| o != Ordering::Equal)
            }
            (QueryOperator::Gt, Some(expected)) => {
                compare_values(actual, expected) == Some(Ordering::Greater)
            }
            (QueryOperator::Gte, Some(expected)) => matches!(
                compare_values(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            (QueryOperator::Lt, Some(expected)) => {
                compare_values(actual, expected) == Some(Ordering::Less)
            }
            (QueryOperator::Lte, Some(expected)) => matches!(
                compare_values(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            (QueryOperator::Like, Some(Value::String(pattern))) => {
                like_matches(actual, pattern, false)
            }
            (QueryOperator::ILike, Some(Value::String(pattern))) => {
                like_matches(actual, pattern, true)
            }
            (QueryOperator::In, Some(Value::Array(items))) => items
                .iter()
                .any(|item| compare_values(actual, item) == Some(Ordering::Equal)),
            (QueryOperator::NotIn, Some(Value::Array(items))) => items
                .iter()
                .all(|item| compare_values(actual, item) != Some(Ordering::Equal)),
            _ => false,
        }
    }
}

impl QueryBuilder {
    /// Apply filters, ordering, offset and limit to an iterator of rows
    pub fn evaluate<'a, I>(&self, rows: I) -> Vec<Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut selected: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.conditions.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if !self.order_by.is_empty() {
            selected.sort_by(|a, b| {
                for (field, order) in &self.order_by {
                    let left = a.get(field).unwrap_or(&Value::Null);
                    let right = b.get(field).unwrap_or(&Value::Null);
                    let ordering = sort_order(left, right);
                    let ordering = match order {
                        SortOrder::Asc => ordering,
                        SortOrder::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = usize::try_from(self.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = self
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        selected.into_iter().skip(offset).take(limit).collect()
    }
}

/// Compare two non-null scalars of the same kind; mixed kinds are incomparable
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order for sorting: NULL is greater than everything
fn sort_order(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_values(left, right).unwrap_or(Ordering::Equal),
    }
}

fn like_matches(actual: &Value, pattern: &str, case_insensitive: bool) -> bool {
    let text = match actual {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return false,
    };

    let mut expression = String::from(if case_insensitive { "(?is)^" } else { "(?s)^" });
    for c in pattern.chars() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            other => expression.push_str(&regex::escape(&other.to_string())),
        }
    }
    expression.push('$');

    Regex::new(&expression).is_ok_and(|re| re.is_match(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    fn products() -> Vec<Row> {
        vec![
            row(json!({"id": 1, "title": "Trail Boots", "price": 12000, "promo_price": null})),
            row(json!({"id": 2, "title": "Sandals", "price": 4500, "promo_price": 3900})),
            row(json!({"id": 3, "title": "Rain boots", "price": 8000, "promo_price": null})),
        ]
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    #[test]
    fn test_comparisons() {
        let rows = products();
        let cheap = QueryBuilder::new().filter(QueryFilter::lt("price", json!(9000)));
        assert_eq!(ids(&cheap.evaluate(&rows)), vec![2, 3]);

        let exact = QueryBuilder::new().filter(QueryFilter::eq("price", json!(4500.0)));
        assert_eq!(ids(&exact.evaluate(&rows)), vec![2]);
    }

    #[test]
    fn test_null_semantics() {
        let rows = products();
        let with_promo = QueryBuilder::new().filter(QueryFilter::is_not_null("promo_price"));
        assert_eq!(ids(&with_promo.evaluate(&rows)), vec![2]);

        // NULL never satisfies an ordinary comparison
        let ne = QueryBuilder::new().filter(QueryFilter::ne("promo_price", json!(3900)));
        assert!(ne.evaluate(&rows).is_empty());
    }

    #[test]
    fn test_like_and_ilike() {
        let rows = products();
        let like = QueryBuilder::new().filter(QueryFilter::like("title", "%boots"));
        assert_eq!(ids(&like.evaluate(&rows)), vec![3]);

        let ilike = QueryBuilder::new().filter(QueryFilter::ilike("title", "%BOOTS"));
        assert_eq!(ids(&ilike.evaluate(&rows)), vec![1, 3]);

        let single = QueryBuilder::new().filter(QueryFilter::like("title", "Sandal_"));
        assert_eq!(ids(&single.evaluate(&rows)), vec![2]);
    }

    #[test]
    fn test_in_and_groups() {
        let rows = products();
        let query = QueryBuilder::new().filter(QueryFilter::or(vec![
            QueryFilter::in_values("id", vec![json!(1), json!(2)]),
            QueryFilter::gt("price", json!(7000)),
        ]));
        assert_eq!(ids(&query.evaluate(&rows)), vec![1, 2, 3]);

        let none = QueryBuilder::new().filter(QueryFilter::in_values("id", vec![]));
        assert!(none.evaluate(&rows).is_empty());

        let all = QueryBuilder::new().filter(QueryFilter::not_in_values("id", vec![]));
        assert_eq!(all.evaluate(&rows).len(), 3);
    }

    #[test]
    fn test_ordering_and_paging() {
        let rows = products();
        let query = QueryBuilder::new()
            .order_by("price", SortOrder::Desc)
            .offset(1)
            .limit(1);
        assert_eq!(ids(&query.evaluate(&rows)), vec![3]);

        // NULLs last ascending
        let by_promo = QueryBuilder::new().order_by("promo_price", SortOrder::Asc);
        assert_eq!(ids(&by_promo.evaluate(&rows))[0], 2);
    }
}
