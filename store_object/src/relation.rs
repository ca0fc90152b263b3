//! Declared foreign-key relations and their on-delete policies
//!
//! A [`Relation`] is static metadata owned by the dependent side: the table that
//! holds the foreign key. The `#[model]` macro emits one per
//! `#[foreign_key(...)]` field.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What happens to dependents when the referenced record is soft deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Soft delete the dependents too, recursively
    Cascade,
    /// Clear the dependents' foreign key; they stay active
    SetNull,
    /// Refuse the delete while any dependent exists
    Protect,
    Ignore,
}

impl OnDelete {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "cascade",
            OnDelete::SetNull => "set_null",
            OnDelete::Protect => "protect",
            OnDelete::Ignore => "ignore",
        }
    }

    /// Matching `ON DELETE` action for the storage-level constraint
    ///
    /// `Ignore` relations are not backed by a constraint at all.
    pub fn storage_action(&self) -> Option<&'static str> {
        match self {
            OnDelete::Cascade => Some("CASCADE"),
            OnDelete::SetNull => Some("SET NULL"),
            OnDelete::Protect => Some("RESTRICT"),
            OnDelete::Ignore => None,
        }
    }
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown on_delete policy '{0}' (expected cascade, set_null, protect or ignore)")]
pub struct ParseOnDeleteError(pub String);

impl FromStr for OnDelete {
    type Err = ParseOnDeleteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(OnDelete::Cascade),
            "set_null" | "setnull" => Ok(OnDelete::SetNull),
            "protect" => Ok(OnDelete::Protect),
            "ignore" | "do_nothing" => Ok(OnDelete::Ignore),
            _ => Err(ParseOnDeleteError(s.to_string())),
        }
    }
}

/// Directed edge from a dependent table to the table it references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    pub dependent_table: &'static str,
    pub foreign_key: &'static str,
    pub referenced_table: &'static str,
    pub on_delete: OnDelete,
}

impl Relation {
    pub const fn new(
        dependent_table: &'static str,
        foreign_key: &'static str,
        referenced_table: &'static str,
        on_delete: OnDelete,
    ) -> Self {
        Self {
            dependent_table,
            foreign_key,
            referenced_table,
            on_delete,
        }
    }

    pub fn is_self_referential(&self) -> bool {
        self.dependent_table == self.referenced_table
    }
}
