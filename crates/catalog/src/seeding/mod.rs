//! Catalog seeding
//!
//! Definitions of the fixed module catalog, the loaders that write it in one
//! transaction, and the environment-gated seeder runner.

pub mod catalog;
pub mod loader;
pub mod seeder;

pub use catalog::{
    Catalog, ParameterDefinition, TemplateDefinition, TemplateRef, MODULE_PARAMETERS,
    MODULE_TEMPLATES,
};
pub use loader::{load_parameters, load_templates, seed_catalog, SeedReport, SeedStage, TemplateIndex};
pub use seeder::{ModuleCatalogSeeder, Seeder, SeederManager, SeederOutcome};
