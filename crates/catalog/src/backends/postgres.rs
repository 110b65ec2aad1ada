//! PostgreSQL Backend Implementation
//!
//! Uses a sqlx `PgPool`. A seed run holds one sqlx transaction for its whole
//! duration, so a failure anywhere leaves both tables untouched.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use super::core::*;
use super::BackendKind;
use crate::config::DatabaseConfig;
use crate::error::{SeedError, SeedResult};
use crate::models::{
    Model, ModuleParameter, ModuleTemplate, NewModuleParameter, NewModuleTemplate,
};
use crate::schema::catalog_schema;

/// PostgreSQL catalog backend
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pool from the configuration
    pub async fn connect(config: &DatabaseConfig) -> SeedResult<Self> {
        let pool_config = &config.pool;
        let options = PgPoolOptions::new()
            .max_connections(pool_config.max_connections)
            .min_connections(pool_config.min_connections)
            .acquire_timeout(Duration::from_secs(pool_config.acquire_timeout_seconds))
            .idle_timeout(pool_config.idle_timeout_seconds.map(Duration::from_secs))
            .max_lifetime(pool_config.max_lifetime_seconds.map(Duration::from_secs))
            .test_before_acquire(pool_config.test_before_acquire);

        let pool = options.connect(&config.database_url).await.map_err(|e| {
            SeedError::Connection(format!("Failed to create PostgreSQL pool: {}", e))
        })?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin_sqlx(&self) -> SeedResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| SeedError::Transaction(format!("Failed to begin transaction: {}", e)))
    }

    async fn find_template_where(
        &self,
        column: &str,
        value: &str,
    ) -> SeedResult<Option<ModuleTemplate>> {
        let sql = format!(
            "{} WHERE {} = $1 ORDER BY {} LIMIT 1",
            ModuleTemplate::select_sql(),
            column,
            ModuleTemplate::primary_key_name()
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(ModuleTemplate::from_row).transpose()
    }
}

#[async_trait]
impl CatalogBackend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PostgreSQL
    }

    async fn migrate(&self) -> SeedResult<()> {
        let mut tx = self.begin_sqlx().await?;
        for statement in catalog_schema().statements() {
            tracing::debug!("Applying schema statement: {}", statement);
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit()
            .await
            .map_err(|e| SeedError::Transaction(format!("Failed to commit schema: {}", e)))?;
        tracing::info!("Catalog schema is up to date");
        Ok(())
    }

    async fn begin(&self) -> SeedResult<Box<dyn CatalogTransaction>> {
        let tx = self.begin_sqlx().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn templates(&self) -> SeedResult<Vec<ModuleTemplate>> {
        let sql = format!(
            "{} ORDER BY {}",
            ModuleTemplate::select_sql(),
            ModuleTemplate::primary_key_name()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(ModuleTemplate::from_row).collect()
    }

    async fn parameters(&self) -> SeedResult<Vec<ModuleParameter>> {
        let sql = format!(
            "{} ORDER BY {}",
            ModuleParameter::select_sql(),
            ModuleParameter::primary_key_name()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(ModuleParameter::from_row).collect()
    }

    async fn find_template_by_file(&self, file: &str) -> SeedResult<Option<ModuleTemplate>> {
        self.find_template_where("file", file).await
    }

    async fn find_template_by_javascript_model(
        &self,
        javascript_model: &str,
    ) -> SeedResult<Option<ModuleTemplate>> {
        self.find_template_where("javascript_model", javascript_model)
            .await
    }

    async fn parameters_for_template(&self, template_id: i64) -> SeedResult<Vec<ModuleParameter>> {
        let sql = format!(
            "{} WHERE module_template_id = $1 ORDER BY {}",
            ModuleParameter::select_sql(),
            ModuleParameter::primary_key_name()
        );
        let rows = sqlx::query(&sql)
            .bind(template_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(ModuleParameter::from_row).collect()
    }

    async fn counts(&self) -> SeedResult<CatalogCounts> {
        let templates: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {}",
            ModuleTemplate::table_name()
        ))
        .fetch_one(&self.pool)
        .await?;
        let parameters: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {}",
            ModuleParameter::table_name()
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(CatalogCounts {
            templates: templates.max(0) as u64,
            parameters: parameters.max(0) as u64,
        })
    }

    async fn clear(&self) -> SeedResult<CatalogCounts> {
        let mut tx = self.begin_sqlx().await?;
        let parameters = sqlx::query(&format!("DELETE FROM {}", ModuleParameter::table_name()))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let templates = sqlx::query(&format!("DELETE FROM {}", ModuleTemplate::table_name()))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit()
            .await
            .map_err(|e| SeedError::Transaction(format!("Failed to commit clear: {}", e)))?;

        Ok(CatalogCounts {
            templates,
            parameters,
        })
    }

    async fn health_check(&self) -> SeedResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| SeedError::Connection(format!("Health check failed: {}", e)))?;
        Ok(start.elapsed())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// One sqlx transaction; dropped without commit means rolled back
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogTransaction for PostgresTransaction {
    async fn insert_template(&mut self, template: &NewModuleTemplate) -> SeedResult<ModuleTemplate> {
        let sql = format!(
            "INSERT INTO {} (name, file, javascript_model) VALUES ($1, $2, $3) RETURNING {}",
            ModuleTemplate::table_name(),
            ModuleTemplate::columns().join(", ")
        );
        let row = sqlx::query(&sql)
            .bind(template.name.as_str())
            .bind(template.file.as_str())
            .bind(template.javascript_model.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        ModuleTemplate::from_row(&row)
    }

    async fn insert_parameter(
        &mut self,
        parameter: &NewModuleParameter,
    ) -> SeedResult<ModuleParameter> {
        let sql = format!(
            "INSERT INTO {} (key, module_template_id) VALUES ($1, $2) RETURNING {}",
            ModuleParameter::table_name(),
            ModuleParameter::columns().join(", ")
        );
        let row = sqlx::query(&sql)
            .bind(parameter.key.as_str())
            .bind(parameter.module_template_id)
            .fetch_one(&mut *self.tx)
            .await?;
        ModuleParameter::from_row(&row)
    }

    async fn commit(self: Box<Self>) -> SeedResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| SeedError::Transaction(format!("Transaction commit failed: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> SeedResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| SeedError::Transaction(format!("Transaction rollback failed: {}", e)))
    }
}
