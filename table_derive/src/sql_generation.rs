//! Code generation for `TableMetadata`
//!
//! DDL is rendered to string literals at expansion time; identifiers were
//! validated while parsing, so quoting them here is enough.

use proc_macro2::TokenStream;
use quote::quote;
use store_object::OnDelete;
use syn::Ident;

use crate::parsing::{FieldInfo, TableInfo};

const DEFAULT_SOFT_DELETE_FIELD: &str = "is_active";

fn quoted(name: &str) -> String {
    format!("\"{}\"", name)
}

fn soft_delete_column(field_info: &FieldInfo) -> &str {
    field_info
        .soft_delete_field
        .as_deref()
        .unwrap_or(DEFAULT_SOFT_DELETE_FIELD)
}

/// Primary key column; uuid and integer keys get a database-side default
fn primary_key_definition(field_info: &FieldInfo) -> String {
    let rust_type = field_info.primary_key_rust_type();
    let column = quoted(&field_info.primary_key_name());
    match rust_type.as_str() {
        "Uuid" | "uuid::Uuid" => format!("{} UUID PRIMARY KEY DEFAULT gen_random_uuid()", column),
        "i32" => format!("{} SERIAL PRIMARY KEY", column),
        "i64" => format!("{} BIGSERIAL PRIMARY KEY", column),
        other => format!(
            "{} {} PRIMARY KEY",
            column,
            type_mapping::rust_type_to_pg_type(other)
        ),
    }
}

pub fn create_table_sql(table_info: &TableInfo, field_info: &FieldInfo) -> String {
    let mut definitions = vec![primary_key_definition(field_info)];

    for column in field_info.columns.iter().filter(|c| !c.is_system()) {
        let mut definition = format!(
            "{} {}",
            quoted(&column.name),
            type_mapping::rust_type_to_pg_type(&column.rust_type)
        );
        // Columns that are never written on insert stay nullable
        if column.create && !column.is_optional() {
            definition.push_str(" NOT NULL");
        }
        if let Some(fk) = &column.foreign_key {
            if let Some(action) = fk.on_delete.storage_action() {
                definition.push_str(&format!(
                    " REFERENCES {} ON DELETE {}",
                    quoted(&fk.references),
                    action
                ));
            }
        }
        definitions.push(definition);
    }

    for timestamp in crate::parsing::SYSTEM_TIMESTAMPS {
        definitions.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted(timestamp)));
    }
    definitions.push(format!(
        "{} BOOLEAN NOT NULL DEFAULT TRUE",
        quoted(soft_delete_column(field_info))
    ));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quoted(&table_info.name),
        definitions.join(",\n    ")
    )
}

/// Index on the soft-delete flag and on every foreign key
pub fn create_indexes_sql(table_info: &TableInfo, field_info: &FieldInfo) -> Vec<String> {
    let table = &table_info.name;
    let mut columns = vec![soft_delete_column(field_info)];
    columns.extend(field_info.foreign_keys().map(|(column, _)| column.name.as_str()));

    columns
        .into_iter()
        .map(|column| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("idx_{}_{}", table, column)),
                quoted(table),
                quoted(column)
            )
        })
        .collect()
}

fn on_delete_tokens(policy: OnDelete) -> TokenStream {
    match policy {
        OnDelete::Cascade => quote! { ::vitrine::store_object::OnDelete::Cascade },
        OnDelete::SetNull => quote! { ::vitrine::store_object::OnDelete::SetNull },
        OnDelete::Protect => quote! { ::vitrine::store_object::OnDelete::Protect },
        OnDelete::Ignore => quote! { ::vitrine::store_object::OnDelete::Ignore },
    }
}

pub fn generate_table_metadata_impl(
    name: &Ident,
    table_info: &TableInfo,
    field_info: &FieldInfo,
) -> TokenStream {
    let table_name = &table_info.name;
    let primary_key_field = &field_info.primary_key_field;
    let primary_key_name = field_info.primary_key_name();
    let primary_key_type = &field_info.primary_key_type;
    let create_fields = field_info.create_fields();
    let update_fields = field_info.update_fields();
    let soft_delete_field = soft_delete_column(field_info);

    let relations: Vec<TokenStream> = field_info
        .foreign_keys()
        .map(|(column, fk)| {
            let foreign_key = &column.name;
            let references = &fk.references;
            let on_delete = on_delete_tokens(fk.on_delete);
            quote! {
                ::vitrine::store_object::Relation::new(#table_name, #foreign_key, #references, #on_delete)
            }
        })
        .collect();

    let create_table_sql = create_table_sql(table_info, field_info);
    let create_indexes_sql = create_indexes_sql(table_info, field_info);

    quote! {
        impl ::vitrine::store_object::TableMetadata for #name {
            type Id = #primary_key_type;

            fn table_name() -> &'static str {
                #table_name
            }

            fn primary_key_field() -> &'static str {
                #primary_key_name
            }

            fn soft_delete_field() -> &'static str {
                #soft_delete_field
            }

            fn create_fields() -> &'static [&'static str] {
                &[#(#create_fields),*]
            }

            fn update_fields() -> &'static [&'static str] {
                &[#(#update_fields),*]
            }

            fn relations() -> &'static [::vitrine::store_object::Relation] {
                const RELATIONS: &[::vitrine::store_object::Relation] = &[#(#relations),*];
                RELATIONS
            }

            fn extract_id(&self) -> Self::Id {
                ::std::clone::Clone::clone(&self.#primary_key_field)
            }

            fn create_table_sql() -> String {
                #create_table_sql.to_string()
            }

            fn create_indexes_sql() -> Vec<String> {
                vec![#(#create_indexes_sql.to_string()),*]
            }
        }
    }
}
