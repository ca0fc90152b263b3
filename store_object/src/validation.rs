//! SQL identifier validation
//!
//! Table and column names are interpolated into generated SQL, so every one of
//! them passes through [`ValidatedTableName`] or [`ValidatedFieldName`] first.

use std::fmt;
use thiserror::Error;

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid characters in name '{0}': only alphanumeric characters and underscores are allowed")]
    InvalidCharacters(String),

    /// PostgreSQL truncates identifiers past 63 bytes
    #[error("Name '{name}' is too long: {length} characters (max {max_length})")]
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },

    #[error("Name cannot be empty")]
    Empty,

    #[error("Name '{0}' must start with a letter or underscore")]
    InvalidStartCharacter(String),

    #[error("Name '{0}' is a reserved SQL keyword")]
    ReservedKeyword(String),
}

const MAX_IDENTIFIER_LENGTH: usize = 63;

const RESERVED_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT",
    "FULL", "OUTER", "ON", "AS", "AND", "OR", "NOT", "NULL", "TRUE", "FALSE", "IN", "IS",
    "LIKE", "ILIKE", "BETWEEN", "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "OFFSET", "UNION",
    "ALL", "ANY", "DISTINCT", "CREATE", "DROP", "ALTER", "TABLE", "INDEX", "VIEW", "SCHEMA",
    "PRIMARY", "KEY", "FOREIGN", "REFERENCES", "UNIQUE", "CHECK", "DEFAULT", "CONSTRAINT",
    "COLUMN", "CASCADE", "RESTRICT", "GRANT", "USER", "TO", "WITH", "RETURNING", "CASE",
    "WHEN", "THEN", "ELSE", "END", "CAST", "ARRAY", "FOR", "TRIGGER", "FUNCTION",
];

fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let first_char = name.chars().next().ok_or(ValidationError::Empty)?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }

    if RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str()) {
        return Err(ValidationError::ReservedKeyword(name.to_string()));
    }

    Ok(())
}

/// A validated table name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTableName(String);

impl ValidatedTableName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for interpolation into SQL
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for ValidatedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated field name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedFieldName(String);

impl ValidatedFieldName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        validate_identifier(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for ValidatedFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
