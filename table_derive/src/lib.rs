//! Procedural macros for declaring stored models
//!
//! `#[model]` adds the serde derives and [`TableMetadata`](derive@TableMetadata),
//! which records the table name, primary key, soft-delete flag, writable fields
//! and foreign-key relations with their on-delete policy.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod model_macro;
mod parsing;
mod sql_generation;

use model_macro::model_attribute;
use parsing::{parse_field_attributes, parse_table_attributes};
use sql_generation::generate_table_metadata_impl;

/// Derive macro for the `TableMetadata` trait
///
/// Prefer `#[model]`, which adds this derive along with the serde derives.
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize, TableMetadata)]
/// #[table(name = "order_items")]
/// pub struct OrderItem {
///     #[primary_key]
///     pub id: Uuid,
///
///     #[field(create)]
///     #[foreign_key(references = "orders", on_delete = "cascade")]
///     pub order_id: Uuid,
///
///     #[field(create, update)]
///     #[foreign_key(references = "products", on_delete = "protect")]
///     pub product_id: Uuid,
///
///     #[field(readonly)]
///     pub created_at: DateTime<Utc>,
/// }
/// ```
#[proc_macro_derive(
    TableMetadata,
    attributes(table, primary_key, field, soft_delete, foreign_key)
)]
pub fn derive_table_metadata(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let field_info = match parse_field_attributes(&input.data, &table_info) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    generate_table_metadata_impl(&input.ident, &table_info, &field_info).into()
}

/// Convenience attribute macro that adds all necessary derives for a database model
///
/// ```ignore
/// use vitrine::prelude::*;
///
/// #[model]
/// #[table(name = "categories")]
/// pub struct Category {
///     #[primary_key]
///     pub id: Uuid,
///
///     #[field(create, update)]
///     #[foreign_key(references = "categories", on_delete = "cascade")]
///     pub parent_id: Option<Uuid>,
///
///     #[field(create, update)]
///     pub title: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}
