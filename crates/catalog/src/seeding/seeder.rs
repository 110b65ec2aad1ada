//! Database seeding system with environment controls

use std::collections::HashSet;

use async_trait::async_trait;

use super::catalog::Catalog;
use super::loader::seed_catalog;
use crate::backends::{CatalogBackend, CatalogCounts};
use crate::config::Environment;
use crate::error::{SeedError, SeedResult};

/// Seeder trait for implementing database seeders
#[async_trait]
pub trait Seeder: Send + Sync {
    /// Get the seeder name for logging and tracking
    fn name(&self) -> &str;

    /// Get environments where this seeder should run
    fn environments(&self) -> Vec<Environment> {
        vec![Environment::Development, Environment::Testing]
    }

    /// Check if this seeder should run in the given environment
    fn should_run(&self, env: &Environment) -> bool {
        self.environments().contains(env)
    }

    /// Run the seeder, returning the rows it created
    async fn run(&self, backend: &dyn CatalogBackend) -> SeedResult<CatalogCounts>;

    /// Remove the data this seeder creates
    async fn rollback(&self, _backend: &dyn CatalogBackend) -> SeedResult<()> {
        Ok(())
    }

    /// Get seeder priority (lower numbers run first)
    fn priority(&self) -> i32 {
        100
    }

    /// Names of seeders that must run first
    fn dependencies(&self) -> Vec<String> {
        vec![]
    }
}

/// Loads the module template and parameter catalogs
#[derive(Debug, Clone)]
pub struct ModuleCatalogSeeder {
    catalog: Catalog,
}

impl ModuleCatalogSeeder {
    pub const NAME: &'static str = "module_catalog";

    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Default for ModuleCatalogSeeder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Seeder for ModuleCatalogSeeder {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// Reference data is needed everywhere, production included
    fn environments(&self) -> Vec<Environment> {
        vec![
            Environment::Development,
            Environment::Testing,
            Environment::Staging,
            Environment::Production,
        ]
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn run(&self, backend: &dyn CatalogBackend) -> SeedResult<CatalogCounts> {
        let report = seed_catalog(backend, &self.catalog).await?;
        Ok(report.counts())
    }

    async fn rollback(&self, backend: &dyn CatalogBackend) -> SeedResult<()> {
        let removed = backend.clear().await?;
        tracing::warn!(
            "Rolled back seeder {}: removed {} templates and {} parameters",
            self.name(),
            removed.templates,
            removed.parameters
        );
        Ok(())
    }
}

/// What one seeder created during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeederOutcome {
    pub seeder: String,
    pub created: CatalogCounts,
}

/// Seeder manager for running multiple seeders
#[derive(Default)]
pub struct SeederManager {
    seeders: Vec<Box<dyn Seeder>>,
}

impl SeederManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager preloaded with the module catalog seeder
    pub fn with_module_catalog() -> Self {
        Self::new().add(ModuleCatalogSeeder::new())
    }

    /// Add a seeder to the manager
    pub fn add<S: Seeder + 'static>(mut self, seeder: S) -> Self {
        self.seeders.push(Box::new(seeder));
        self
    }

    pub fn len(&self) -> usize {
        self.seeders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeders.is_empty()
    }

    /// Names of the seeders that would run in `env`, in execution order
    pub fn plan(&self, env: &Environment) -> SeedResult<Vec<String>> {
        let applicable = self.applicable(|seeder| seeder.should_run(env));
        Ok(Self::resolve_dependencies(applicable)?
            .into_iter()
            .map(|seeder| seeder.name().to_string())
            .collect())
    }

    /// Run all seeders for the given environment
    pub async fn run_for_environment(
        &self,
        backend: &dyn CatalogBackend,
        env: &Environment,
    ) -> SeedResult<Vec<SeederOutcome>> {
        if !env.is_safe_for_seeding() {
            return Err(SeedError::UnsafeEnvironment(env.as_str().to_string()));
        }

        let ordered = Self::resolve_dependencies(self.applicable(|seeder| seeder.should_run(env)))?;
        tracing::info!(
            "Running {} seeders for environment: {}",
            ordered.len(),
            env.as_str()
        );

        Self::run_ordered(backend, ordered, false).await
    }

    /// Force run production seeders (use with caution)
    pub async fn run_production_force(
        &self,
        backend: &dyn CatalogBackend,
    ) -> SeedResult<Vec<SeederOutcome>> {
        let ordered = Self::resolve_dependencies(
            self.applicable(|seeder| seeder.should_run(&Environment::Production)),
        )?;

        tracing::warn!(
            "Force running {} seeders in PRODUCTION environment",
            ordered.len()
        );

        Self::run_ordered(backend, ordered, true).await
    }

    /// Run seeders for the environment named in the process environment
    pub async fn run(&self, backend: &dyn CatalogBackend) -> SeedResult<Vec<SeederOutcome>> {
        let env = Self::current_environment();
        self.run_for_environment(backend, &env).await
    }

    /// Roll back the seeders of `env` in reverse execution order
    pub async fn rollback_for_environment(
        &self,
        backend: &dyn CatalogBackend,
        env: &Environment,
    ) -> SeedResult<()> {
        let ordered = Self::resolve_dependencies(self.applicable(|seeder| seeder.should_run(env)))?;
        for seeder in ordered.into_iter().rev() {
            tracing::warn!("Rolling back seeder: {}", seeder.name());
            seeder.rollback(backend).await?;
        }
        Ok(())
    }

    /// Get current environment from environment variables
    pub fn current_environment() -> Environment {
        Environment::from_env()
    }

    fn applicable<F>(&self, filter: F) -> Vec<&dyn Seeder>
    where
        F: Fn(&dyn Seeder) -> bool,
    {
        self.seeders
            .iter()
            .map(|seeder| seeder.as_ref())
            .filter(|seeder| filter(*seeder))
            .collect()
    }

    async fn run_ordered(
        backend: &dyn CatalogBackend,
        ordered: Vec<&dyn Seeder>,
        production: bool,
    ) -> SeedResult<Vec<SeederOutcome>> {
        let mut outcomes = Vec::with_capacity(ordered.len());
        for seeder in ordered {
            if production {
                tracing::warn!("Running production seeder: {}", seeder.name());
            } else {
                tracing::info!("Running seeder: {}", seeder.name());
            }

            let created = seeder.run(backend).await?;
            tracing::info!(
                "Seeder {} completed: created {} templates, {} parameters",
                seeder.name(),
                created.templates,
                created.parameters
            );
            outcomes.push(SeederOutcome {
                seeder: seeder.name().to_string(),
                created,
            });
        }
        Ok(outcomes)
    }

    /// Order seeders so every dependency runs first; among seeders that are
    /// ready at the same time, lower priority runs first, then declaration
    /// order
    fn resolve_dependencies(seeders: Vec<&dyn Seeder>) -> SeedResult<Vec<&dyn Seeder>> {
        let names: HashSet<&str> = seeders.iter().map(|s| s.name()).collect();
        let dependencies: Vec<Vec<String>> = seeders.iter().map(|s| s.dependencies()).collect();

        for (seeder, deps) in seeders.iter().zip(&dependencies) {
            if let Some(missing) = deps.iter().find(|dep| !names.contains(dep.as_str())) {
                return Err(SeedError::Validation(format!(
                    "Seeder '{}' depends on '{}', but '{}' was not found",
                    seeder.name(),
                    missing,
                    missing
                )));
            }
        }

        let mut done: HashSet<&str> = HashSet::new();
        let mut pending: Vec<usize> = (0..seeders.len()).collect();
        let mut ordered = Vec::with_capacity(seeders.len());

        while !pending.is_empty() {
            let next = pending
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, i)| dependencies[i].iter().all(|dep| done.contains(dep.as_str())))
                .min_by_key(|&(_, i)| (seeders[i].priority(), i))
                .map(|(slot, _)| slot);

            let Some(slot) = next else {
                let stuck: Vec<&str> = pending.iter().map(|&i| seeders[i].name()).collect();
                return Err(SeedError::Validation(format!(
                    "Circular dependency detected in seeders: {}",
                    stuck.join(", ")
                )));
            };

            let index = pending.remove(slot);
            done.insert(seeders[index].name());
            ordered.push(seeders[index]);
        }

        Ok(ordered)
    }
}
