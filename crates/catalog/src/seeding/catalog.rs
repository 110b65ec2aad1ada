//! Module catalog definitions
//!
//! The fixed reference data: seven simulation component kinds and the
//! configuration keys each one accepts. Parameters name their template by a
//! stable symbol rather than by its position in the template list.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{SeedError, SeedResult};
use crate::models::NewModuleTemplate;

/// One template to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateDefinition {
    /// Symbol parameters use to refer to this template
    pub key: &'static str,
    pub name: &'static str,
    pub file: &'static str,
    pub javascript_model: &'static str,
}

impl TemplateDefinition {
    pub const fn new(
        key: &'static str,
        name: &'static str,
        file: &'static str,
        javascript_model: &'static str,
    ) -> Self {
        Self {
            key,
            name,
            file,
            javascript_model,
        }
    }

    pub fn to_insert(&self) -> NewModuleTemplate {
        NewModuleTemplate::new(self.name, self.file, self.javascript_model)
    }
}

/// How a parameter names its template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateRef {
    /// By template symbol
    Key(&'static str),
    /// By position in the catalog's template list
    Position(usize),
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateRef::Key(key) => write!(f, "key '{}'", key),
            TemplateRef::Position(index) => write!(f, "position {}", index),
        }
    }
}

/// One parameter to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterDefinition {
    pub template: TemplateRef,
    pub key: &'static str,
}

impl ParameterDefinition {
    pub const fn new(template: &'static str, key: &'static str) -> Self {
        Self {
            template: TemplateRef::Key(template),
            key,
        }
    }

    pub const fn positional(index: usize, key: &'static str) -> Self {
        Self {
            template: TemplateRef::Position(index),
            key,
        }
    }
}

pub static MODULE_TEMPLATES: &[TemplateDefinition] = &[
    TemplateDefinition::new("lipid", "Lipids", "lipid", "Lipid"),
    TemplateDefinition::new("dna", "DNA", "dna", "DNA"),
    TemplateDefinition::new("metabolism", "Metabolism Enzyme", "metabolism", "Metabolism"),
    TemplateDefinition::new("protein", "Protein", "protein", "Protein"),
    TemplateDefinition::new("substrate", "Substrate", "substrate", "Substrate"),
    TemplateDefinition::new("transporter", "Transporter", "transporter", "Transporter"),
    TemplateDefinition::new("cellgrowth", "Cell growth", "cellgrowth", "CellGrowth"),
];

pub static MODULE_PARAMETERS: &[ParameterDefinition] = &[
    // Lipid
    ParameterDefinition::new("lipid", "k"),
    ParameterDefinition::new("lipid", "consume"),
    ParameterDefinition::new("lipid", "dna"),
    // DNA
    ParameterDefinition::new("dna", "k"),
    ParameterDefinition::new("dna", "consume"),
    // Metabolism
    ParameterDefinition::new("metabolism", "k"),
    ParameterDefinition::new("metabolism", "k_m"),
    ParameterDefinition::new("metabolism", "k_d"),
    ParameterDefinition::new("metabolism", "v"),
    ParameterDefinition::new("metabolism", "dna"),
    ParameterDefinition::new("metabolism", "orig"),
    ParameterDefinition::new("metabolism", "dest"),
    // Protein
    ParameterDefinition::new("protein", "dna"),
    ParameterDefinition::new("protein", "k"),
    ParameterDefinition::new("protein", "substrate"),
    // Substrate
    ParameterDefinition::new("substrate", "placement"),
    ParameterDefinition::new("substrate", "supply"),
    // Transporter
    ParameterDefinition::new("transporter", "k"),
    ParameterDefinition::new("transporter", "k_tr"),
    ParameterDefinition::new("transporter", "k_m"),
    ParameterDefinition::new("transporter", "orig"),
    ParameterDefinition::new("transporter", "dest"),
    ParameterDefinition::new("transporter", "dna"),
    ParameterDefinition::new("transporter", "consume"),
    // CellGrowth
    ParameterDefinition::new("cellgrowth", "consume"),
    ParameterDefinition::new("cellgrowth", "infrastructure"),
];

/// Ordered template and parameter definitions for one seed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub templates: Vec<TemplateDefinition>,
    pub parameters: Vec<ParameterDefinition>,
}

impl Catalog {
    pub fn new(templates: Vec<TemplateDefinition>, parameters: Vec<ParameterDefinition>) -> Self {
        Self {
            templates,
            parameters,
        }
    }

    /// The fixed simulation module catalog
    pub fn builtin() -> Self {
        Self::new(MODULE_TEMPLATES.to_vec(), MODULE_PARAMETERS.to_vec())
    }

    /// Position of the template a reference points at
    pub fn resolve(&self, reference: TemplateRef) -> Option<usize> {
        match reference {
            TemplateRef::Key(key) => self.templates.iter().position(|t| t.key == key),
            TemplateRef::Position(index) => (index < self.templates.len()).then_some(index),
        }
    }

    /// Parameter keys declared for the template at `position`
    pub fn parameter_keys(&self, position: usize) -> Vec<&'static str> {
        self.parameters
            .iter()
            .filter(|p| self.resolve(p.template) == Some(position))
            .map(|p| p.key)
            .collect()
    }

    /// Check every definition without touching storage
    pub fn validate(&self) -> SeedResult<()> {
        let mut template_keys = HashSet::new();
        for (position, template) in self.templates.iter().enumerate() {
            if template.key.trim().is_empty() {
                return Err(SeedError::Validation(format!(
                    "template at position {} has an empty key",
                    position
                )));
            }
            if let Err(SeedError::Validation(detail)) = template.to_insert().validate() {
                return Err(SeedError::Validation(format!(
                    "template '{}': {}",
                    template.key, detail
                )));
            }
            if !template_keys.insert(template.key) {
                return Err(SeedError::Validation(format!(
                    "template key '{}' is declared more than once",
                    template.key
                )));
            }
        }

        let mut parameter_keys = HashSet::new();
        for parameter in &self.parameters {
            if parameter.key.trim().is_empty() {
                return Err(SeedError::Validation(format!(
                    "parameter of template {} has an empty key",
                    parameter.template
                )));
            }
            let position =
                self.resolve(parameter.template)
                    .ok_or_else(|| SeedError::UnresolvedTemplate {
                        parameter: parameter.key.to_string(),
                        reference: parameter.template.to_string(),
                    })?;
            if !parameter_keys.insert((position, parameter.key)) {
                return Err(SeedError::Validation(format!(
                    "parameter '{}' is declared more than once for template '{}'",
                    parameter.key, self.templates[position].key
                )));
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sizes() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.templates.len(), 7);
        assert_eq!(catalog.parameters.len(), 26);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_builtin_parameter_keys() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.parameter_keys(0), vec!["k", "consume", "dna"]);
        assert_eq!(
            catalog.parameter_keys(2),
            vec!["k", "k_m", "k_d", "v", "dna", "orig", "dest"]
        );
        assert_eq!(
            catalog.parameter_keys(5),
            vec!["k", "k_tr", "k_m", "orig", "dest", "dna", "consume"]
        );
        assert_eq!(catalog.parameter_keys(6), vec!["consume", "infrastructure"]);
    }

    #[test]
    fn test_builtin_template_keys_match_files() {
        for template in MODULE_TEMPLATES {
            assert_eq!(template.key, template.file);
        }
    }

    #[test]
    fn test_resolve_references() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.resolve(TemplateRef::Key("protein")), Some(3));
        assert_eq!(catalog.resolve(TemplateRef::Position(6)), Some(6));
        assert_eq!(catalog.resolve(TemplateRef::Position(7)), None);
        assert_eq!(catalog.resolve(TemplateRef::Key("ribosome")), None);
    }

    #[test]
    fn test_out_of_range_position_is_referential() {
        let mut catalog = Catalog::builtin();
        catalog.parameters.push(ParameterDefinition::positional(7, "k"));

        let err = catalog.validate().unwrap_err();
        assert!(err.is_referential());
        assert_eq!(
            err,
            SeedError::UnresolvedTemplate {
                parameter: "k".to_string(),
                reference: "position 7".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_template_key_rejected() {
        let catalog = Catalog::new(
            vec![
                TemplateDefinition::new("dna", "DNA", "dna", "DNA"),
                TemplateDefinition::new("dna", "DNA copy", "dna", "DNA"),
            ],
            vec![],
        );
        assert!(matches!(catalog.validate(), Err(SeedError::Validation(_))));
    }

    #[test]
    fn test_duplicate_key_within_template_rejected() {
        let catalog = Catalog::new(
            vec![TemplateDefinition::new("dna", "DNA", "dna", "DNA")],
            vec![
                ParameterDefinition::new("dna", "k"),
                ParameterDefinition::positional(0, "k"),
            ],
        );
        assert!(matches!(catalog.validate(), Err(SeedError::Validation(_))));
    }

    #[test]
    fn test_empty_columns_rejected() {
        let catalog = Catalog::new(
            vec![TemplateDefinition::new("lipid", "Lipids", "lipid", "")],
            vec![],
        );
        let err = catalog.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: template 'lipid': module_templates.javascript_model must not be empty"
        );

        let catalog = Catalog::new(
            vec![TemplateDefinition::new("lipid", "Lipids", "lipid", "Lipid")],
            vec![ParameterDefinition::new("lipid", " ")],
        );
        assert!(matches!(catalog.validate(), Err(SeedError::Validation(_))));
    }
}
