//! In-process catalog backend
//!
//! Mirrors the PostgreSQL semantics the loaders rely on: identities come from
//! per-table sequences that are never rewound (a rolled back insert burns its
//! id), check and foreign key constraints are enforced on insert (foreign
//! keys again on commit), and staged rows only become visible on commit, in
//! id order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use super::core::*;
use super::BackendKind;
use crate::error::{SeedError, SeedResult};
use crate::models::{ModuleParameter, ModuleTemplate, NewModuleParameter, NewModuleTemplate};

#[derive(Debug)]
struct MemoryState {
    templates: Vec<ModuleTemplate>,
    parameters: Vec<ModuleParameter>,
    next_template_id: i64,
    next_parameter_id: i64,
    /// Writes left before inserts start failing; `None` never fails
    writes_remaining: Option<usize>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            templates: Vec::new(),
            parameters: Vec::new(),
            next_template_id: 1,
            next_parameter_id: 1,
            writes_remaining: None,
        }
    }
}

impl MemoryState {
    fn consume_write(&mut self) -> SeedResult<()> {
        match self.writes_remaining.as_mut() {
            Some(0) => Err(SeedError::Database(
                "simulated write failure: storage rejected the insert".to_string(),
            )),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Catalog store held in process memory; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `writes` inserts succeed, then fail every later insert
    ///
    /// A poisoned lock is recovered here: the counter is written whole, so
    /// no half-updated state can be observed through it.
    pub fn fail_after_writes(self, writes: usize) -> Self {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .writes_remaining = Some(writes);
        self
    }

    fn lock(&self) -> SeedResult<MutexGuard<'_, MemoryState>> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<MemoryState>) -> SeedResult<MutexGuard<'_, MemoryState>> {
    state
        .lock()
        .map_err(|_| SeedError::Database("memory store lock poisoned".to_string()))
}

#[async_trait]
impl CatalogBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn migrate(&self) -> SeedResult<()> {
        tracing::debug!("Memory backend needs no schema");
        Ok(())
    }

    async fn begin(&self) -> SeedResult<Box<dyn CatalogTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            templates: Vec::new(),
            parameters: Vec::new(),
        }))
    }

    async fn templates(&self) -> SeedResult<Vec<ModuleTemplate>> {
        Ok(self.lock()?.templates.clone())
    }

    async fn parameters(&self) -> SeedResult<Vec<ModuleParameter>> {
        Ok(self.lock()?.parameters.clone())
    }

    async fn find_template_by_file(&self, file: &str) -> SeedResult<Option<ModuleTemplate>> {
        Ok(self
            .lock()?
            .templates
            .iter()
            .find(|t| t.file == file)
            .cloned())
    }

    async fn find_template_by_javascript_model(
        &self,
        javascript_model: &str,
    ) -> SeedResult<Option<ModuleTemplate>> {
        Ok(self
            .lock()?
            .templates
            .iter()
            .find(|t| t.javascript_model == javascript_model)
            .cloned())
    }

    async fn parameters_for_template(&self, template_id: i64) -> SeedResult<Vec<ModuleParameter>> {
        Ok(self
            .lock()?
            .parameters
            .iter()
            .filter(|p| p.module_template_id == template_id)
            .cloned()
            .collect())
    }

    async fn counts(&self) -> SeedResult<CatalogCounts> {
        let state = self.lock()?;
        Ok(CatalogCounts {
            templates: state.templates.len() as u64,
            parameters: state.parameters.len() as u64,
        })
    }

    async fn clear(&self) -> SeedResult<CatalogCounts> {
        let mut state = self.lock()?;
        let removed = CatalogCounts {
            templates: state.templates.len() as u64,
            parameters: state.parameters.len() as u64,
        };
        state.parameters.clear();
        state.templates.clear();
        Ok(removed)
    }

    async fn health_check(&self) -> SeedResult<Duration> {
        let start = Instant::now();
        drop(self.lock()?);
        Ok(start.elapsed())
    }

    async fn close(&self) {}
}

/// Staged writes of one seed run
pub struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    templates: Vec<ModuleTemplate>,
    parameters: Vec<ModuleParameter>,
}

#[async_trait]
impl CatalogTransaction for MemoryTransaction {
    async fn insert_template(&mut self, template: &NewModuleTemplate) -> SeedResult<ModuleTemplate> {
        template
            .validate()
            .map_err(|e| SeedError::Database(format!("check constraint violated: {}", e)))?;

        let mut state = lock_state(&self.state)?;
        state.consume_write()?;
        let id = state.next_template_id;
        state.next_template_id += 1;
        drop(state);

        let row = template.clone().into_model(id, Utc::now());
        self.templates.push(row.clone());
        Ok(row)
    }

    async fn insert_parameter(
        &mut self,
        parameter: &NewModuleParameter,
    ) -> SeedResult<ModuleParameter> {
        parameter
            .validate()
            .map_err(|e| SeedError::Database(format!("check constraint violated: {}", e)))?;

        let mut state = lock_state(&self.state)?;
        let template_id = parameter.module_template_id;
        let referenced = self.templates.iter().any(|t| t.id == template_id)
            || state.templates.iter().any(|t| t.id == template_id);
        if !referenced {
            return Err(SeedError::Database(format!(
                "insert on table \"module_parameters\" violates foreign key constraint: \
                 module_template_id={} is not present in \"module_templates\"",
                template_id
            )));
        }

        state.consume_write()?;
        let id = state.next_parameter_id;
        state.next_parameter_id += 1;
        drop(state);

        let row = parameter.clone().into_model(id, Utc::now());
        self.parameters.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> SeedResult<()> {
        let MemoryTransaction {
            state: shared,
            templates,
            parameters,
        } = *self;
        let mut state = lock_state(&shared)
            .map_err(|e| SeedError::Transaction(format!("Transaction commit failed: {}", e)))?;

        // The parent may have been deleted since the insert was staged.
        let orphan = parameters.iter().find(|p| {
            !templates.iter().any(|t| t.id == p.module_template_id)
                && !state.templates.iter().any(|t| t.id == p.module_template_id)
        });
        if let Some(orphan) = orphan {
            return Err(SeedError::Transaction(format!(
                "Transaction commit failed: parameter '{}' references module_template_id={} \
                 which no longer exists",
                orphan.key, orphan.module_template_id
            )));
        }

        // Transactions may commit out of id order; reads rely on id order.
        state.templates.extend(templates);
        state.templates.sort_by_key(|t| t.id);
        state.parameters.extend(parameters);
        state.parameters.sort_by_key(|p| p.id);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> SeedResult<()> {
        tracing::debug!(
            "Discarding {} staged templates and {} staged parameters",
            self.templates.len(),
            self.parameters.len()
        );
        Ok(())
    }
}
