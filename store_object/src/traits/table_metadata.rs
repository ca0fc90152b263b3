use crate::id_type::HasUniversalId;
use crate::relation::Relation;
use crate::schema::{TableSchema, DEFAULT_SOFT_DELETE_FIELD};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Static metadata about a model's table
///
/// Derive it with the `#[model]` attribute, which also adds the serde derives:
///
/// ```ignore
/// use vitrine::prelude::*;
///
/// #[model]
/// #[table(name = "products")]
/// pub struct Product {
///     #[primary_key]
///     pub id: Uuid,
///
///     #[field(create, update)]
///     #[foreign_key(references = "categories", on_delete = "cascade")]
///     pub category_id: Uuid,
///
///     #[field(create, update)]
///     pub title: String,
///
///     #[soft_delete]
///     pub is_active: bool,
/// }
/// ```
pub trait TableMetadata:
    Clone + Send + Sync + Debug + Serialize + DeserializeOwned + 'static
{
    type Id: Clone + Send + Sync + Debug + HasUniversalId;

    fn table_name() -> &'static str;

    fn primary_key_field() -> &'static str;

    /// Boolean column flipped by soft delete
    fn soft_delete_field() -> &'static str {
        DEFAULT_SOFT_DELETE_FIELD
    }

    /// Columns written on insert, besides the primary key and the soft-delete flag
    fn create_fields() -> &'static [&'static str];

    /// Columns written by `update`
    fn update_fields() -> &'static [&'static str];

    /// Foreign keys held by this table
    fn relations() -> &'static [Relation] {
        &[]
    }

    fn extract_id(&self) -> Self::Id;

    fn create_table_sql() -> String;

    fn drop_table_sql() -> String {
        format!("DROP TABLE IF EXISTS \"{}\" CASCADE", Self::table_name())
    }

    fn create_indexes_sql() -> Vec<String> {
        vec![]
    }

    fn schema() -> TableSchema {
        TableSchema::new(
            Self::table_name(),
            Self::primary_key_field(),
            Self::soft_delete_field(),
            Self::relations(),
        )
    }
}
