//! Core Catalog Backend Traits
//!
//! The seed loaders only ever see these traits. A backend hands out one
//! transaction per seed run; nothing written through it is visible until
//! `commit` and everything is discarded on `rollback` or drop.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SeedResult;
use crate::models::{ModuleParameter, ModuleTemplate, NewModuleParameter, NewModuleTemplate};

/// Write side of a seed run
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Insert one template and return the stored row with its identity
    async fn insert_template(&mut self, template: &NewModuleTemplate) -> SeedResult<ModuleTemplate>;

    /// Insert one parameter; its template must exist in this transaction or
    /// in committed storage
    async fn insert_parameter(
        &mut self,
        parameter: &NewModuleParameter,
    ) -> SeedResult<ModuleParameter>;

    async fn commit(self: Box<Self>) -> SeedResult<()>;

    async fn rollback(self: Box<Self>) -> SeedResult<()>;
}

/// Row counts of both catalog tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub templates: u64,
    pub parameters: u64,
}

/// Storage for the module catalogs
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Which kind of store this is
    fn kind(&self) -> crate::backends::BackendKind;

    /// Create the catalog tables if they are missing
    async fn migrate(&self) -> SeedResult<()>;

    /// Begin a transaction for a seed run
    async fn begin(&self) -> SeedResult<Box<dyn CatalogTransaction>>;

    /// All templates ordered by identity
    async fn templates(&self) -> SeedResult<Vec<ModuleTemplate>>;

    /// All parameters ordered by identity
    async fn parameters(&self) -> SeedResult<Vec<ModuleParameter>>;

    /// Oldest template with the given `file` slug
    async fn find_template_by_file(&self, file: &str) -> SeedResult<Option<ModuleTemplate>>;

    /// Oldest template bound to the given client-side model
    async fn find_template_by_javascript_model(
        &self,
        javascript_model: &str,
    ) -> SeedResult<Option<ModuleTemplate>>;

    /// Parameters declared by one template, ordered by identity
    async fn parameters_for_template(&self, template_id: i64) -> SeedResult<Vec<ModuleParameter>>;

    async fn counts(&self) -> SeedResult<CatalogCounts>;

    /// Delete every parameter and template in one transaction
    async fn clear(&self) -> SeedResult<CatalogCounts>;

    /// Round-trip a trivial statement and report its latency
    async fn health_check(&self) -> SeedResult<Duration>;

    async fn close(&self);
}
