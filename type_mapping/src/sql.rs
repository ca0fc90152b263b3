//! SQL type conversion utilities
//!
//! Maps the stringified Rust type of a model field onto the PostgreSQL type
//! used in generated `CREATE TABLE` statements.

/// Map Rust type names to PostgreSQL types for DDL generation
///
/// `Option<T>` maps to the same type as `T`; nullability is decided separately
/// through [`is_optional_type`].
pub fn rust_type_to_pg_type(rust_type: &str) -> &'static str {
    // Normalize type string by removing all whitespace for consistent matching
    let normalized = rust_type.replace(' ', "");
    match strip_option(&normalized) {
        "Uuid" | "uuid::Uuid" => "UUID",
        "String" => "VARCHAR",
        "i8" | "i16" => "SMALLINT",
        "i32" | "u16" => "INTEGER",
        "i64" | "u32" => "BIGINT",
        "u64" => "NUMERIC(20,0)", // PostgreSQL doesn't have native u64
        "f32" => "REAL",
        "f64" => "DOUBLE PRECISION",
        "bool" => "BOOLEAN",
        "DateTime<Utc>" | "chrono::DateTime<chrono::Utc>" | "chrono::NaiveDateTime" => {
            "TIMESTAMPTZ"
        }
        "NaiveDate" | "chrono::NaiveDate" => "DATE",
        "serde_json::Value" | "Value" => "JSONB",
        "Vec<String>" => "TEXT[]",
        _ => "VARCHAR", // default fallback
    }
}

/// Check if a Rust type is Optional (nullable in SQL)
pub fn is_optional_type(rust_type: &str) -> bool {
    let normalized = rust_type.replace(' ', "");
    normalized.starts_with("Option<") || normalized.starts_with("std::option::Option<")
}

/// Peel one `Option<...>` layer off a whitespace-free type string
pub fn strip_option(rust_type: &str) -> &str {
    let inner = rust_type
        .strip_prefix("std::option::Option<")
        .or_else(|| rust_type.strip_prefix("Option<"));

    match inner.and_then(|rest| rest.strip_suffix('>')) {
        Some(inner) => inner,
        None => rust_type,
    }
}
