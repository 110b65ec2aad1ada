//! # cellsim-catalog: Module catalogs for the cell simulation database
//!
//! Schema, storage backends and seed loaders for the two reference tables
//! the simulator reads at startup: `module_templates` (the kinds of
//! simulation component) and `module_parameters` (the configuration keys
//! each kind accepts).
//!
//! ```no_run
//! use cellsim_catalog::{backends, seed_catalog, Catalog, DatabaseConfig};
//!
//! # async fn run() -> cellsim_catalog::SeedResult<()> {
//! let backend = backends::connect(&DatabaseConfig::from_env()?).await?;
//! backend.migrate().await?;
//! let report = seed_catalog(backend.as_ref(), &Catalog::builtin()).await?;
//! assert_eq!(report.counts().templates, 7);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod seeding;

pub use backends::{
    BackendKind, CatalogBackend, CatalogCounts, CatalogTransaction, MemoryBackend, PostgresBackend,
};
pub use config::{DatabaseConfig, Environment, PoolConfig, DEFAULT_DATABASE_URL};
pub use error::{ErrorCategory, SeedError, SeedResult};
pub use models::{Model, ModuleParameter, ModuleTemplate, NewModuleParameter, NewModuleTemplate};
pub use schema::{catalog_schema, drop_catalog_schema, SchemaBuilder, TableBuilder};
pub use seeding::*;
