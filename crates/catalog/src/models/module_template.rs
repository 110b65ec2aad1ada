//! `module_templates` rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::Model;
use crate::error::{SeedError, SeedResult};

/// A kind of simulation component, e.g. a lipid or a transporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTemplate {
    pub id: i64,
    /// Human-readable label
    pub name: String,
    /// Slug of the resource consumers load for this kind
    pub file: String,
    /// Name of the client-side model bound to this kind
    pub javascript_model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for ModuleTemplate {
    fn table_name() -> &'static str {
        "module_templates"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name", "file", "javascript_model", "created_at", "updated_at"]
    }

    fn primary_key(&self) -> i64 {
        self.id
    }

    fn from_row(row: &PgRow) -> SeedResult<Self> {
        Ok(Self {
            id: row.try_get("id").map_err(column_error("id"))?,
            name: row.try_get("name").map_err(column_error("name"))?,
            file: row.try_get("file").map_err(column_error("file"))?,
            javascript_model: row
                .try_get("javascript_model")
                .map_err(column_error("javascript_model"))?,
            created_at: row.try_get("created_at").map_err(column_error("created_at"))?,
            updated_at: row.try_get("updated_at").map_err(column_error("updated_at"))?,
        })
    }
}

/// Insert payload for a template; identity and timestamps come from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModuleTemplate {
    pub name: String,
    pub file: String,
    pub javascript_model: String,
}

impl NewModuleTemplate {
    pub fn new(
        name: impl Into<String>,
        file: impl Into<String>,
        javascript_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            javascript_model: javascript_model.into(),
        }
    }

    /// Reject empty columns before they reach storage
    pub fn validate(&self) -> SeedResult<()> {
        for (column, value) in [
            ("name", &self.name),
            ("file", &self.file),
            ("javascript_model", &self.javascript_model),
        ] {
            if value.trim().is_empty() {
                return Err(SeedError::Validation(format!(
                    "module_templates.{} must not be empty",
                    column
                )));
            }
        }
        Ok(())
    }

    /// Materialize the row a store would return for this payload
    pub fn into_model(self, id: i64, timestamp: DateTime<Utc>) -> ModuleTemplate {
        ModuleTemplate {
            id,
            name: self.name,
            file: self.file,
            javascript_model: self.javascript_model,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

pub(crate) fn column_error(column: &'static str) -> impl Fn(sqlx::Error) -> SeedError {
    move |e| SeedError::Database(format!("Failed to read column '{}': {}", column, e))
}
