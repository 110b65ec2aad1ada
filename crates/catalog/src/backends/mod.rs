//! Catalog Backend Abstractions
//!
//! Storage is reached through the [`CatalogBackend`] / [`CatalogTransaction`]
//! traits so the loaders run unchanged against PostgreSQL or the in-process
//! store.

pub mod core;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

pub use self::core::*;
pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;

use crate::config::DatabaseConfig;
use crate::error::{SeedError, SeedResult};

/// Backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    PostgreSQL,
    Memory,
}

impl BackendKind {
    /// Detect backend type from a database URL
    pub fn detect(url: &str) -> SeedResult<Self> {
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Ok(BackendKind::PostgreSQL)
        } else if url.starts_with("memory://") {
            Ok(BackendKind::Memory)
        } else {
            Err(SeedError::Configuration(format!(
                "Unable to detect database backend from URL: {}",
                url
            )))
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::PostgreSQL => write!(f, "postgresql"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(BackendKind::PostgreSQL),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(SeedError::Configuration(format!(
                "Unsupported database backend: {}",
                s
            ))),
        }
    }
}

/// Open the backend selected by the configured URL
pub async fn connect(config: &DatabaseConfig) -> SeedResult<Arc<dyn CatalogBackend>> {
    config.validate()?;

    let backend: Arc<dyn CatalogBackend> = match BackendKind::detect(&config.database_url)? {
        BackendKind::PostgreSQL => Arc::new(PostgresBackend::connect(config).await?),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    };

    tracing::info!(
        "Connected to {} catalog backend at {}",
        backend.kind(),
        config.masked_url()
    );
    Ok(backend)
}
