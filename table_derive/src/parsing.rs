//! Parsing utilities for table and field attributes
//!
//! Handles `#[table]`, `#[primary_key]`, `#[field]`, `#[soft_delete]` and
//! `#[foreign_key]`, and validates every identifier with the same rules the
//! store applies at runtime.

use quote::ToTokens;
use std::str::FromStr;
use store_object::{OnDelete, ValidatedFieldName, ValidatedTableName};
use syn::{Attribute, Data, Error, Fields, Ident, LitStr, Result, Type};

/// Timestamp columns every generated table carries
pub const SYSTEM_TIMESTAMPS: [&str; 2] = ["created_at", "updated_at"];

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    ValidatedTableName::new(name)
        .map(|_| ())
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validate field name and return syn::Error for better proc macro error handling
pub fn validate_field_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    ValidatedFieldName::new(name)
        .map(|_| ())
        .map_err(|e| Error::new(span, format!("Invalid field name '{}': {}", name, e)))
}

#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ForeignKeyInfo {
    pub references: String,
    pub on_delete: OnDelete,
}

/// One non-key column of the model
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    /// Stringified type with whitespace removed
    pub rust_type: String,
    pub create: bool,
    pub update: bool,
    pub foreign_key: Option<ForeignKeyInfo>,
}

impl ColumnInfo {
    pub fn is_optional(&self) -> bool {
        type_mapping::is_optional_type(&self.rust_type)
    }

    /// Created, updated and soft-delete columns are emitted by the table itself
    pub fn is_system(&self) -> bool {
        SYSTEM_TIMESTAMPS.contains(&self.name.as_str())
    }
}

#[derive(Debug)]
pub struct FieldInfo {
    pub primary_key_field: Ident,
    pub primary_key_type: Type,
    pub soft_delete_field: Option<String>,
    pub columns: Vec<ColumnInfo>,
}

impl FieldInfo {
    pub fn primary_key_name(&self) -> String {
        self.primary_key_field.to_string()
    }

    pub fn primary_key_rust_type(&self) -> String {
        normalize_type(&self.primary_key_type)
    }

    pub fn create_fields(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.create)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn update_fields(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.update)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (&ColumnInfo, &ForeignKeyInfo)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c, fk)))
    }
}

fn normalize_type(ty: &Type) -> String {
    ty.to_token_stream().to_string().replace(' ', "")
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut table_name: Option<LitStr> = None;

    for attr in attrs.iter().filter(|a| a.path().is_ident("table")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                table_name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported table attribute, expected `name = \"...\"`"))
            }
        })?;
    }

    let table_name = table_name.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "table attribute is required: add #[table(name = \"table_name\")] to your struct",
        )
    })?;

    validate_table_name_syn(&table_name.value(), table_name.span())?;

    Ok(TableInfo {
        name: table_name.value(),
    })
}

pub fn parse_field_attributes(data: &Data, table_info: &TableInfo) -> Result<FieldInfo> {
    let Data::Struct(data_struct) = data else {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "TableMetadata can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields_named) = &data_struct.fields else {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "TableMetadata can only be derived for structs with named fields",
        ));
    };

    let mut primary_key: Option<(Ident, Type)> = None;
    let mut soft_delete_field = None;
    let mut columns = Vec::new();

    for field in &fields_named.named {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
        let field_name_str = field_name.to_string();
        validate_field_name_syn(&field_name_str, field_name.span())?;

        if has_attribute(&field.attrs, "primary_key") {
            if primary_key.is_some() {
                return Err(Error::new_spanned(field_name, "only one #[primary_key] is allowed"));
            }
            primary_key = Some((field_name.clone(), field.ty.clone()));
            continue;
        }

        if has_attribute(&field.attrs, "soft_delete") {
            if normalize_type(&field.ty) != "bool" {
                return Err(Error::new_spanned(&field.ty, "#[soft_delete] field must be a bool"));
            }
            soft_delete_field = Some(field_name_str);
            continue;
        }

        let (create, update) = parse_field_operations(&field.attrs)?;
        let column = ColumnInfo {
            name: field_name_str,
            rust_type: normalize_type(&field.ty),
            create,
            update,
            foreign_key: parse_foreign_key(&field.attrs)?,
        };

        if let Some(fk) = &column.foreign_key {
            if fk.on_delete == OnDelete::SetNull && !column.is_optional() {
                return Err(Error::new_spanned(
                    &field.ty,
                    format!(
                        "{}.{} uses on_delete = \"set_null\" and must be an Option<_>",
                        table_info.name, column.name
                    ),
                ));
            }
        }
        columns.push(column);
    }

    let (primary_key_field, primary_key_type) = primary_key.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            format!("{} needs a #[primary_key] field", table_info.name),
        )
    })?;

    Ok(FieldInfo {
        primary_key_field,
        primary_key_type,
        soft_delete_field,
        columns,
    })
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// `(create, update)` flags from `#[field(...)]`; a bare `#[field]` means both
pub fn parse_field_operations(attrs: &[Attribute]) -> Result<(bool, bool)> {
    let mut create = false;
    let mut update = false;
    let mut readonly = false;

    for attr in attrs.iter().filter(|a| a.path().is_ident("field")) {
        if matches!(attr.meta, syn::Meta::Path(_)) {
            create = true;
            update = true;
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("create") {
                create = true;
            } else if meta.path.is_ident("update") {
                update = true;
            } else if meta.path.is_ident("readonly") {
                readonly = true;
            } else {
                return Err(meta.error("expected `create`, `update` or `readonly`"));
            }
            Ok(())
        })?;
    }

    if readonly {
        return Ok((false, false));
    }
    Ok((create, update))
}

pub fn parse_foreign_key(attrs: &[Attribute]) -> Result<Option<ForeignKeyInfo>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("foreign_key")) else {
        return Ok(None);
    };

    let mut references: Option<LitStr> = None;
    let mut on_delete: Option<LitStr> = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("references") {
            references = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("on_delete") {
            on_delete = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error("expected `references` or `on_delete`"));
        }
        Ok(())
    })?;

    let references = references
        .ok_or_else(|| Error::new_spanned(attr, "foreign_key needs `references = \"table\"`"))?;
    validate_table_name_syn(&references.value(), references.span())?;

    let on_delete = on_delete
        .ok_or_else(|| Error::new_spanned(attr, "foreign_key needs `on_delete = \"...\"`"))?;
    let policy = OnDelete::from_str(&on_delete.value())
        .map_err(|e| Error::new(on_delete.span(), e.to_string()))?;

    Ok(Some(ForeignKeyInfo {
        references: references.value(),
        on_delete: policy,
    }))
}
