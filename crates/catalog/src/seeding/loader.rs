//! Catalog loaders
//!
//! Templates are inserted first and their assigned identities captured in a
//! [`TemplateIndex`]; parameters are then resolved through that index and
//! inserted. Both batches share one transaction, so a seed run either
//! commits the whole catalog or nothing.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::catalog::{Catalog, ParameterDefinition, TemplateDefinition, TemplateRef};
use crate::backends::{CatalogBackend, CatalogCounts, CatalogTransaction};
use crate::error::{SeedError, SeedResult};
use crate::models::{ModuleParameter, ModuleTemplate, NewModuleParameter};

/// Progress of a seed run; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStage {
    TemplatesPending,
    TemplatesLoaded,
    ParametersLoaded,
}

impl fmt::Display for SeedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedStage::TemplatesPending => write!(f, "templates pending"),
            SeedStage::TemplatesLoaded => write!(f, "templates loaded"),
            SeedStage::ParametersLoaded => write!(f, "parameters loaded"),
        }
    }
}

/// Templates created in this run, addressable by symbol or position
#[derive(Debug, Default)]
pub struct TemplateIndex {
    by_key: HashMap<&'static str, usize>,
    templates: Vec<ModuleTemplate>,
}

impl TemplateIndex {
    pub fn resolve(&self, reference: TemplateRef) -> Option<&ModuleTemplate> {
        match reference {
            TemplateRef::Key(key) => self.by_key.get(key).map(|&i| &self.templates[i]),
            TemplateRef::Position(index) => self.templates.get(index),
        }
    }

    /// Created templates in definition order
    pub fn templates(&self) -> &[ModuleTemplate] {
        &self.templates
    }

    pub fn into_templates(self) -> Vec<ModuleTemplate> {
        self.templates
    }
}

/// Outcome of a committed seed run
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub stage: SeedStage,
    pub templates: Vec<ModuleTemplate>,
    pub parameters: Vec<ModuleParameter>,
}

impl SeedReport {
    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            templates: self.templates.len() as u64,
            parameters: self.parameters.len() as u64,
        }
    }

    /// Parameters created for one template
    pub fn parameters_of(&self, template_id: i64) -> Vec<&ModuleParameter> {
        self.parameters
            .iter()
            .filter(|p| p.module_template_id == template_id)
            .collect()
    }
}

/// Insert every template and return the symbol → identity mapping
pub async fn load_templates(
    tx: &mut dyn CatalogTransaction,
    definitions: &[TemplateDefinition],
) -> SeedResult<TemplateIndex> {
    let mut index = TemplateIndex::default();

    for definition in definitions {
        if index.by_key.contains_key(definition.key) {
            return Err(SeedError::Validation(format!(
                "template key '{}' is declared more than once",
                definition.key
            )));
        }

        let template = tx.insert_template(&definition.to_insert()).await?;
        tracing::debug!(
            "Created module template '{}' (file: {}, id: {})",
            template.name,
            template.file,
            template.id
        );

        index.by_key.insert(definition.key, index.templates.len());
        index.templates.push(template);
    }

    Ok(index)
}

/// Resolve every parameter's template, then insert them all
///
/// Resolution completes before the first insert, so an unresolvable
/// reference never leaves a partial batch behind in the transaction.
pub async fn load_parameters(
    tx: &mut dyn CatalogTransaction,
    definitions: &[ParameterDefinition],
    index: &TemplateIndex,
) -> SeedResult<Vec<ModuleParameter>> {
    let resolved = definitions
        .iter()
        .map(|definition| {
            index
                .resolve(definition.template)
                .map(|template| NewModuleParameter::new(definition.key, template.id))
                .ok_or_else(|| SeedError::UnresolvedTemplate {
                    parameter: definition.key.to_string(),
                    reference: definition.template.to_string(),
                })
        })
        .collect::<SeedResult<Vec<_>>>()?;

    let mut parameters = Vec::with_capacity(resolved.len());
    for parameter in &resolved {
        let created = tx.insert_parameter(parameter).await?;
        tracing::debug!(
            "Created module parameter '{}' for template {} (id: {})",
            created.key,
            created.module_template_id,
            created.id
        );
        parameters.push(created);
    }

    Ok(parameters)
}

/// Validate the catalog, then load templates and parameters in one
/// transaction
///
/// Re-running against a populated store adds a second copy of the catalog;
/// clear the tables first to replace it.
pub async fn seed_catalog(backend: &dyn CatalogBackend, catalog: &Catalog) -> SeedResult<SeedReport> {
    catalog.validate()?;

    tracing::info!(
        "Seeding module catalog: {} templates, {} parameters",
        catalog.templates.len(),
        catalog.parameters.len()
    );

    let mut stage = SeedStage::TemplatesPending;
    let mut tx = backend.begin().await?;

    match load_catalog(&mut *tx, catalog, &mut stage).await {
        Ok((templates, parameters)) => {
            tx.commit().await?;
            tracing::info!(
                "Module catalog committed: {} templates, {} parameters",
                templates.len(),
                parameters.len()
            );
            Ok(SeedReport {
                stage,
                templates,
                parameters,
            })
        }
        Err(err) => {
            tracing::error!("Seeding failed at stage '{}': {}", stage, err);
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback after failed seed also failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn load_catalog(
    tx: &mut dyn CatalogTransaction,
    catalog: &Catalog,
    stage: &mut SeedStage,
) -> SeedResult<(Vec<ModuleTemplate>, Vec<ModuleParameter>)> {
    let index = load_templates(tx, &catalog.templates).await?;
    advance(stage, SeedStage::TemplatesLoaded);

    let parameters = load_parameters(tx, &catalog.parameters, &index).await?;
    advance(stage, SeedStage::ParametersLoaded);

    Ok((index.into_templates(), parameters))
}

fn advance(stage: &mut SeedStage, next: SeedStage) {
    debug_assert!(next > *stage);
    tracing::info!("Seed stage: {} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;

    #[tokio::test]
    async fn test_template_index_resolution() {
        let backend = MemoryBackend::new();
        let mut tx = backend.begin().await.unwrap();
        let index = load_templates(&mut *tx, &Catalog::builtin().templates)
            .await
            .unwrap();

        assert_eq!(index.templates().len(), 7);
        let by_key = index.resolve(TemplateRef::Key("cellgrowth")).unwrap();
        let by_position = index.resolve(TemplateRef::Position(6)).unwrap();
        assert_eq!(by_key, by_position);
        assert_eq!(by_key.javascript_model, "CellGrowth");
        assert!(index.resolve(TemplateRef::Position(7)).is_none());
    }

    #[tokio::test]
    async fn test_unresolved_reference_inserts_nothing() {
        let backend = MemoryBackend::new();
        let mut tx = backend.begin().await.unwrap();
        let index = load_templates(&mut *tx, &Catalog::builtin().templates)
            .await
            .unwrap();

        let definitions = [
            ParameterDefinition::new("lipid", "k"),
            ParameterDefinition::positional(12, "k"),
        ];
        let err = load_parameters(&mut *tx, &definitions, &index)
            .await
            .unwrap_err();
        assert!(err.is_referential());

        // The valid first definition was never written either.
        let created = load_parameters(&mut *tx, &definitions[..1], &index)
            .await
            .unwrap();
        assert_eq!(created[0].id, 1);
    }

    #[test]
    fn test_stage_order() {
        assert!(SeedStage::TemplatesPending < SeedStage::TemplatesLoaded);
        assert!(SeedStage::TemplatesLoaded < SeedStage::ParametersLoaded);
        assert_eq!(SeedStage::ParametersLoaded.to_string(), "parameters loaded");
    }
}
