//! Table schemas and the relation registry
//!
//! Relations are declared on the dependent side, so finding what depends on a
//! table means scanning every registered schema. [`RelationRegistry`] does that
//! scan in registration order.

use crate::errors::StoreError;
use crate::relation::Relation;
use crate::traits::TableMetadata;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// Column name used when a model does not mark its own `#[soft_delete]` field
pub const DEFAULT_SOFT_DELETE_FIELD: &str = "is_active";

/// Static description of one table, as seen by the soft-delete engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub primary_key: &'static str,
    pub soft_delete_field: &'static str,
    /// Outbound relations: foreign keys held by this table
    pub relations: &'static [Relation],
}

impl TableSchema {
    pub const fn new(
        table: &'static str,
        primary_key: &'static str,
        soft_delete_field: &'static str,
        relations: &'static [Relation],
    ) -> Self {
        Self {
            table,
            primary_key,
            soft_delete_field,
            relations,
        }
    }

    pub fn relation_for(&self, foreign_key: &str) -> Option<&'static Relation> {
        self.relations.iter().find(|r| r.foreign_key == foreign_key)
    }

    /// Check identifiers and that every relation is declared by this table
    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |field: &str, err: crate::validation::ValidationError| {
            StoreError::validation(self.table, field, err.to_string())
        };

        ValidatedTableName::new(self.table).map_err(|e| invalid("table", e))?;
        ValidatedFieldName::new(self.primary_key).map_err(|e| invalid(self.primary_key, e))?;
        ValidatedFieldName::new(self.soft_delete_field)
            .map_err(|e| invalid(self.soft_delete_field, e))?;

        for relation in self.relations {
            if relation.dependent_table != self.table {
                return Err(StoreError::invalid_configuration(format!(
                    "relation {}.{} is declared on table {}",
                    relation.dependent_table, relation.foreign_key, self.table
                )));
            }
            ValidatedFieldName::new(relation.foreign_key)
                .map_err(|e| invalid(relation.foreign_key, e))?;
            ValidatedTableName::new(relation.referenced_table)
                .map_err(|e| invalid(relation.foreign_key, e))?;
        }

        Ok(())
    }
}

/// Every registered table, keyed by name
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    schemas: IndexMap<&'static str, TableSchema>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table and the relations it declares
    ///
    /// Relations live on the dependent side, so a table's dependents are only
    /// known once those dependent tables are registered too. A PROTECT or
    /// CASCADE relation declared by an unregistered table is never consulted
    /// when the referenced record is deleted.
    pub fn register<T: TableMetadata>(&mut self) -> Result<(), StoreError> {
        self.register_schema(T::schema())
    }

    pub fn register_schema(&mut self, schema: TableSchema) -> Result<(), StoreError> {
        schema.validate()?;
        if self.schemas.contains_key(schema.table) {
            return Err(StoreError::invalid_configuration(format!(
                "table {} is already registered",
                schema.table
            )));
        }
        self.schemas.insert(schema.table, schema);
        Ok(())
    }

    pub fn contains(&self, table: &str) -> bool {
        self.schemas.contains_key(table)
    }

    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.get(table)
    }

    pub fn schema(&self, table: &str) -> Result<&TableSchema, StoreError> {
        self.schemas.get(table).ok_or_else(|| {
            StoreError::invalid_configuration(format!("table {} is not registered", table))
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schemas.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Every table referenced by a registered relation must itself be registered
    pub fn validate(&self) -> Result<(), StoreError> {
        for schema in self.schemas.values() {
            for relation in schema.relations {
                if !self.contains(relation.referenced_table) {
                    return Err(StoreError::invalid_configuration(format!(
                        "{}.{} references unregistered table {}",
                        relation.dependent_table, relation.foreign_key, relation.referenced_table
                    )));
                }
            }
        }
        Ok(())
    }

    /// Inbound relations of `table`, paired with the dependent table's schema
    ///
    /// Only registered dependent tables are scanned.
    pub fn dependents_of(&self, table: &str) -> Vec<(&'static Relation, TableSchema)> {
        self.schemas
            .values()
            .flat_map(|schema| {
                schema
                    .relations
                    .iter()
                    .filter(move |relation| relation.referenced_table == table)
                    .map(move |relation| (relation, *schema))
            })
            .collect()
    }
}

/// Registry shared between the coordinator and every store it hands out
///
/// Readers take a cheap snapshot, so registering a table later is visible to
/// stores created earlier.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry(Arc<RwLock<Arc<RelationRegistry>>>);

impl SharedRegistry {
    pub fn new(registry: RelationRegistry) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(registry))))
    }

    pub fn snapshot(&self) -> Result<Arc<RelationRegistry>, StoreError> {
        self.0
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| StoreError::invalid_configuration("relation registry lock poisoned"))
    }

    pub fn update<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut RelationRegistry) -> Result<(), StoreError>,
    {
        let mut guard = self
            .0
            .write()
            .map_err(|_| StoreError::invalid_configuration("relation registry lock poisoned"))?;
        let mut next = RelationRegistry::clone(&guard);
        apply(&mut next)?;
        *guard = Arc::new(next);
        Ok(())
    }
}
