//! PostgreSQL storage backend
//!
//! Rows are read with `to_jsonb` and written through `jsonb_populate_record`,
//! so column types are always taken from the table definition itself.

use super::{Row, StorageBackend, StorageTransaction};
use crate::errors::StoreError;
use crate::id_type::UniversalId;
use crate::query_builder::{QueryBuilder, SqlGenerator};
use crate::relation::Relation;
use crate::schema::TableSchema;
use crate::scope::QueryScope;
use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};

fn invalid_identifier(table: &str) -> impl Fn(ValidationError) -> StoreError + '_ {
    move |error| StoreError::validation(table, "identifier", error.to_string())
}

fn table_name(schema: &TableSchema) -> Result<ValidatedTableName, StoreError> {
    ValidatedTableName::new(schema.table).map_err(invalid_identifier(schema.table))
}

fn field_name(schema: &TableSchema, field: &str) -> Result<ValidatedFieldName, StoreError> {
    ValidatedFieldName::new(field).map_err(invalid_identifier(schema.table))
}

fn into_row(schema: &TableSchema, value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::storage(
            schema.table,
            "decode",
            format!("expected a JSON object row, got {}", other),
        )),
    }
}

fn ids_param(ids: &[UniversalId]) -> Json<Value> {
    Json(Value::Array(ids.iter().map(UniversalId::to_json).collect()))
}

#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StorageBackend for PgBackend {
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database_operation("transaction", "begin", e))?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn fetch(&self, schema: &TableSchema, query: &QueryBuilder) -> Result<Vec<Row>, StoreError> {
        let table = table_name(schema)?;
        let (where_clause, order_clause, limit_clause, values) = query
            .build(schema.table)
            .map_err(invalid_identifier(schema.table))?;

        let sql = format!(
            "SELECT to_jsonb(t) FROM {} AS t {} {} {}",
            table.quoted(),
            where_clause,
            order_clause,
            limit_clause
        );
        crate::debug_log!(table = schema.table, sql = %sql, "fetch");

        let mut statement = sqlx::query_scalar::<_, Json<Value>>(&sql);
        for value in values {
            statement = statement.bind(Json(value));
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "fetch", e))?;

        rows.into_iter()
            .map(|Json(value)| into_row(schema, value))
            .collect()
    }

    async fn count(&self, schema: &TableSchema, query: &QueryBuilder) -> Result<i64, StoreError> {
        let table = table_name(schema)?;
        let (where_clause, values) = query
            .build_where_clause(schema.table)
            .map_err(invalid_identifier(schema.table))?;

        let sql = format!("SELECT COUNT(*) FROM {} {}", table.quoted(), where_clause);
        crate::debug_log!(table = schema.table, sql = %sql, "count");

        let mut statement = sqlx::query_scalar::<_, i64>(&sql);
        for value in values {
            statement = statement.bind(Json(value));
        }

        statement
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "count", e))
    }

    async fn insert(&self, schema: &TableSchema, row: Row) -> Result<Row, StoreError> {
        let table = table_name(schema)?;
        let columns = row
            .keys()
            .map(|column| field_name(schema, column).map(|f| f.quoted()))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        let sql = format!(
            "WITH inserted AS (INSERT INTO {table} ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1::jsonb) RETURNING *) \
             SELECT to_jsonb(inserted) FROM inserted",
            table = table.quoted(),
            columns = columns
        );
        crate::debug_log!(table = schema.table, sql = %sql, "insert");

        let Json(stored) = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(Value::Object(row)))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "insert", e))?;

        into_row(schema, stored)
    }

    async fn update(
        &self,
        schema: &TableSchema,
        id: &UniversalId,
        changes: Row,
    ) -> Result<Option<Row>, StoreError> {
        let table = table_name(schema)?;
        let primary_key = field_name(schema, schema.primary_key)?;

        let mut assignments = changes
            .keys()
            .filter(|column| column.as_str() != schema.primary_key)
            .map(|column| field_name(schema, column).map(|f| format!("{0} = src.{0}", f.quoted())))
            .collect::<Result<Vec<_>, _>>()?;
        assignments.push("\"updated_at\" = NOW()".to_string());

        let sql = format!(
            "WITH updated AS (UPDATE {table} SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $1::jsonb) AS src \
             WHERE {table}.{pk} = {id_param} RETURNING {table}.*) \
             SELECT to_jsonb(updated) FROM updated",
            table = table.quoted(),
            assignments = assignments.join(", "),
            pk = primary_key.quoted(),
            id_param = SqlGenerator::typed_param(&table, &primary_key, 2)
        );
        crate::debug_log!(table = schema.table, sql = %sql, "update");

        let updated = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(Value::Object(changes)))
            .bind(Json(id.to_json()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "update", e))?;

        updated.map(|Json(row)| into_row(schema, row)).transpose()
    }
}

/// Open database transaction; sqlx rolls it back if dropped uncommitted
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgTransaction {
    /// `UPDATE`/`DELETE` statement over the rows whose primary key is in `$n`
    fn by_ids(
        schema: &TableSchema,
        statement: impl FnOnce(&str) -> String,
        param: usize,
    ) -> Result<String, StoreError> {
        let table = table_name(schema)?;
        let primary_key = field_name(schema, schema.primary_key)?;
        Ok(format!(
            "{} WHERE {} = ANY({})",
            statement(table.quoted().as_str()),
            primary_key.quoted(),
            SqlGenerator::typed_array_param(&table, &primary_key, param)
        ))
    }
}

#[async_trait]
impl StorageTransaction for PgTransaction {
    async fn record_state(
        &mut self,
        schema: &TableSchema,
        id: &UniversalId,
    ) -> Result<Option<bool>, StoreError> {
        let table = table_name(schema)?;
        let primary_key = field_name(schema, schema.primary_key)?;
        let flag = field_name(schema, schema.soft_delete_field)?;

        let sql = format!(
            "SELECT COALESCE({}, TRUE) FROM {} WHERE {} = {} FOR UPDATE",
            flag.quoted(),
            table.quoted(),
            primary_key.quoted(),
            SqlGenerator::typed_param(&table, &primary_key, 1)
        );
        crate::trace_log!(table = schema.table, sql = %sql, "record_state");

        sqlx::query_scalar::<_, bool>(&sql)
            .bind(Json(id.to_json()))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "record_state", e))
    }

    async fn dependents(
        &mut self,
        relation: &Relation,
        dependent: &TableSchema,
        parent_id: &UniversalId,
        scope: QueryScope,
    ) -> Result<Vec<UniversalId>, StoreError> {
        let table = table_name(dependent)?;
        let primary_key = field_name(dependent, dependent.primary_key)?;
        let foreign_key = field_name(dependent, relation.foreign_key)?;
        let flag = field_name(dependent, dependent.soft_delete_field)?;

        let scope_clause = match scope.flag() {
            Some(true) => format!(" AND {} = TRUE", flag.quoted()),
            Some(false) => format!(" AND {} = FALSE", flag.quoted()),
            None => String::new(),
        };

        let sql = format!(
            "SELECT to_jsonb(t) -> '{}' FROM {} AS t WHERE {} = {}{}",
            primary_key.as_str(),
            table.quoted(),
            foreign_key.quoted(),
            SqlGenerator::typed_param(&table, &foreign_key, 1),
            scope_clause
        );
        crate::trace_log!(table = dependent.table, sql = %sql, "dependents");

        let ids = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(Json(parent_id.to_json()))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::database_operation(dependent.table, "dependents", e))?;

        Ok(ids
            .iter()
            .filter_map(|Json(value)| UniversalId::from_json(value))
            .collect())
    }

    async fn set_active(
        &mut self,
        schema: &TableSchema,
        ids: &[UniversalId],
        active: bool,
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let flag = field_name(schema, schema.soft_delete_field)?.quoted();
        let sql = Self::by_ids(
            schema,
            |table| format!("UPDATE {} SET {} = $1, \"updated_at\" = NOW()", table, flag),
            2,
        )?;
        crate::trace_log!(table = schema.table, sql = %sql, "set_active");

        let result = sqlx::query(&sql)
            .bind(active)
            .bind(ids_param(ids))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "set_active", e))?;

        Ok(result.rows_affected())
    }

    async fn clear_foreign_key(
        &mut self,
        schema: &TableSchema,
        foreign_key: &str,
        ids: &[UniversalId],
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let column = field_name(schema, foreign_key)?.quoted();
        let sql = Self::by_ids(
            schema,
            |table| format!("UPDATE {} SET {} = NULL, \"updated_at\" = NOW()", table, column),
            1,
        )?;
        crate::trace_log!(table = schema.table, sql = %sql, "clear_foreign_key");

        let result = sqlx::query(&sql)
            .bind(ids_param(ids))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "clear_foreign_key", e))?;

        Ok(result.rows_affected())
    }

    async fn remove(&mut self, schema: &TableSchema, ids: &[UniversalId]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = Self::by_ids(schema, |table| format!("DELETE FROM {}", table), 1)?;
        crate::trace_log!(table = schema.table, sql = %sql, "remove");

        let result = sqlx::query(&sql)
            .bind(ids_param(ids))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::database_operation(schema.table, "remove", e))?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::database_operation("transaction", "commit", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| StoreError::database_operation("transaction", "rollback", e))
    }
}
