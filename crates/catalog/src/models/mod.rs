//! Catalog Models - persisted rows and their insert payloads
//!
//! Both tables follow the same shape: a system-assigned `BIGSERIAL` id, the
//! catalog columns, and store-assigned timestamps.

pub mod module_parameter;
pub mod module_template;

pub use module_parameter::{ModuleParameter, NewModuleParameter};
pub use module_template::{ModuleTemplate, NewModuleTemplate};

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;

use crate::error::SeedResult;

/// Trait for catalog rows read back from storage
pub trait Model: Send + Sync + Debug + Clone + Serialize + for<'de> Deserialize<'de> {
    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Columns selected when reading this model, in declaration order
    fn columns() -> &'static [&'static str];

    /// Get the primary key value for this model instance
    fn primary_key(&self) -> i64;

    /// Build a model from a PostgreSQL row
    fn from_row(row: &PgRow) -> SeedResult<Self>
    where
        Self: Sized;

    /// `SELECT <columns> FROM <table>` without a trailing clause
    fn select_sql() -> String {
        format!("SELECT {} FROM {}", Self::columns().join(", "), Self::table_name())
    }
}
