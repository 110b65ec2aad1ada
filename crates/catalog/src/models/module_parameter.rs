//! `module_parameters` rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::module_template::column_error;
use super::Model;
use crate::error::{SeedError, SeedResult};

/// A named configuration field belonging to exactly one template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleParameter {
    pub id: i64,
    pub key: String,
    pub module_template_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for ModuleParameter {
    fn table_name() -> &'static str {
        "module_parameters"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "key", "module_template_id", "created_at", "updated_at"]
    }

    fn primary_key(&self) -> i64 {
        self.id
    }

    fn from_row(row: &PgRow) -> SeedResult<Self> {
        Ok(Self {
            id: row.try_get("id").map_err(column_error("id"))?,
            key: row.try_get("key").map_err(column_error("key"))?,
            module_template_id: row
                .try_get("module_template_id")
                .map_err(column_error("module_template_id"))?,
            created_at: row.try_get("created_at").map_err(column_error("created_at"))?,
            updated_at: row.try_get("updated_at").map_err(column_error("updated_at"))?,
        })
    }
}

/// Insert payload for a parameter with its template already resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModuleParameter {
    pub key: String,
    pub module_template_id: i64,
}

impl NewModuleParameter {
    pub fn new(key: impl Into<String>, module_template_id: i64) -> Self {
        Self {
            key: key.into(),
            module_template_id,
        }
    }

    pub fn validate(&self) -> SeedResult<()> {
        if self.key.trim().is_empty() {
            return Err(SeedError::Validation(
                "module_parameters.key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_model(self, id: i64, timestamp: DateTime<Utc>) -> ModuleParameter {
        ModuleParameter {
            id,
            key: self.key,
            module_template_id: self.module_template_id,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql() {
        assert_eq!(
            ModuleParameter::select_sql(),
            "SELECT id, key, module_template_id, created_at, updated_at FROM module_parameters"
        );
    }

    #[test]
    fn test_validate_rejects_blank_key() {
        assert!(NewModuleParameter::new("k_tr", 6).validate().is_ok());
        assert!(matches!(
            NewModuleParameter::new("", 6).validate(),
            Err(SeedError::Validation(_))
        ));
    }
}
