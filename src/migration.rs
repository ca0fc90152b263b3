//! Database migration functionality
//!
//! Creates tables, indexes and the `updated_at` trigger for models managed by
//! [`Vitrine`]. Only available with a PostgreSQL connection; the memory
//! backend needs no schema.

use crate::core::Vitrine;
use crate::errors::VitrineError;
use store_object::TableMetadata;
use tracing::info;

const UPDATED_AT_FUNCTION_SQL: &str = r#"
CREATE OR REPLACE FUNCTION vitrine_touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW."updated_at" = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
"#;

fn updated_at_trigger_sql(table: &str) -> String {
    let trigger = format!("touch_{}_updated_at", table);
    format!(
        "DO $$
         BEGIN
             IF NOT EXISTS (SELECT 1 FROM pg_trigger WHERE tgname = '{trigger}') THEN
                 CREATE TRIGGER \"{trigger}\"
                 BEFORE UPDATE ON \"{table}\"
                 FOR EACH ROW
                 EXECUTE FUNCTION vitrine_touch_updated_at();
             END IF;
         END $$"
    )
}

impl Vitrine {
    /// Create the table and indexes for a model
    /// If recreate is true, drops the existing table first
    pub async fn auto_migrate<T: TableMetadata>(&self, recreate: bool) -> Result<(), VitrineError> {
        let pool = self.pool().ok_or(VitrineError::NotConnected("auto_migrate"))?;
        let table_name = T::table_name();

        if recreate {
            let drop_sql = T::drop_table_sql();
            crate::debug_log!(sql = %drop_sql, "dropping table");
            sqlx::query(&drop_sql).execute(pool).await?;
        }

        let create_table_sql = T::create_table_sql();
        crate::debug_log!(sql = %create_table_sql, "creating table");
        sqlx::query(&create_table_sql).execute(pool).await?;

        sqlx::query(UPDATED_AT_FUNCTION_SQL).execute(pool).await?;
        sqlx::query(&updated_at_trigger_sql(table_name))
            .execute(pool)
            .await?;
        crate::trace_log!(table = table_name, "updated_at trigger in place");

        for index_sql in T::create_indexes_sql() {
            crate::debug_log!(sql = %index_sql, "creating index");
            sqlx::query(&index_sql).execute(pool).await?;
        }

        info!(table = table_name, recreate, "table migrated");
        Ok(())
    }

    /// Register a model and migrate its table
    pub async fn register_with_migration<T: TableMetadata>(
        &self,
        recreate: bool,
    ) -> Result<(), VitrineError> {
        self.auto_migrate::<T>(recreate).await?;
        self.register::<T>()
    }
}
