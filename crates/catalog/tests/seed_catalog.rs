//! Seed run tests against the in-process backend
//!
//! Exercises the full load path: validation, both loaders, commit and
//! rollback, and the consumer queries the simulator uses afterwards.

use std::collections::HashSet;

use cellsim_catalog::{
    seed_catalog, CatalogBackend, CatalogCounts, Catalog, Environment, ErrorCategory,
    MemoryBackend, ModuleCatalogSeeder, ParameterDefinition, SeedError, SeedStage,
    SeederManager, Seeder,
};

fn full_catalog() -> CatalogCounts {
    CatalogCounts {
        templates: 7,
        parameters: 26,
    }
}

async fn parameter_keys(backend: &MemoryBackend, template_id: i64) -> Vec<String> {
    backend
        .parameters_for_template(template_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.key)
        .collect()
}

#[tokio::test]
async fn test_seed_creates_seven_templates() {
    let backend = MemoryBackend::new();
    let report = seed_catalog(&backend, &Catalog::builtin()).await.unwrap();

    assert_eq!(report.stage, SeedStage::ParametersLoaded);
    let templates = backend.templates().await.unwrap();
    assert_eq!(templates.len(), 7);
    assert_eq!(templates, report.templates);

    let ids: HashSet<i64> = templates.iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), 7);
    for template in &templates {
        assert!(!template.name.is_empty());
        assert!(!template.file.is_empty());
        assert!(!template.javascript_model.is_empty());
    }

    let names: Vec<&str> = templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Lipids",
            "DNA",
            "Metabolism Enzyme",
            "Protein",
            "Substrate",
            "Transporter",
            "Cell growth"
        ]
    );
}

#[tokio::test]
async fn test_every_parameter_references_a_seeded_template() {
    let backend = MemoryBackend::new();
    seed_catalog(&backend, &Catalog::builtin()).await.unwrap();

    let template_ids: HashSet<i64> = backend
        .templates()
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    let parameters = backend.parameters().await.unwrap();

    assert_eq!(parameters.len(), 26);
    for parameter in &parameters {
        assert!(!parameter.key.is_empty());
        assert!(template_ids.contains(&parameter.module_template_id));
    }
}

#[tokio::test]
async fn test_lipids_parameters() {
    let backend = MemoryBackend::new();
    seed_catalog(&backend, &Catalog::builtin()).await.unwrap();

    let lipids = backend.find_template_by_file("lipid").await.unwrap().unwrap();
    assert_eq!(lipids.name, "Lipids");
    assert_eq!(lipids.javascript_model, "Lipid");
    assert_eq!(
        parameter_keys(&backend, lipids.id).await,
        vec!["k", "consume", "dna"]
    );
}

#[tokio::test]
async fn test_cell_growth_parameters() {
    let backend = MemoryBackend::new();
    seed_catalog(&backend, &Catalog::builtin()).await.unwrap();

    let growth = backend
        .find_template_by_javascript_model("CellGrowth")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(growth.name, "Cell growth");
    assert_eq!(growth.file, "cellgrowth");
    assert_eq!(
        parameter_keys(&backend, growth.id).await,
        vec!["consume", "infrastructure"]
    );
}

#[tokio::test]
async fn test_report_matches_storage() {
    let backend = MemoryBackend::new();
    let report = seed_catalog(&backend, &Catalog::builtin()).await.unwrap();

    assert_eq!(report.counts(), full_catalog());
    let transporter = &report.templates[5];
    let keys: Vec<&str> = report
        .parameters_of(transporter.id)
        .iter()
        .map(|p| p.key.as_str())
        .collect();
    assert_eq!(keys, vec!["k", "k_tr", "k_m", "orig", "dest", "dna", "consume"]);
}

#[tokio::test]
async fn test_reseeding_is_additive() {
    let backend = MemoryBackend::new();
    let first = seed_catalog(&backend, &Catalog::builtin()).await.unwrap();
    let second = seed_catalog(&backend, &Catalog::builtin()).await.unwrap();

    assert_eq!(
        backend.counts().await.unwrap(),
        CatalogCounts {
            templates: 14,
            parameters: 52
        }
    );

    // The second copy is wired to its own templates.
    let first_ids: HashSet<i64> = first.templates.iter().map(|t| t.id).collect();
    for parameter in &second.parameters {
        assert!(!first_ids.contains(&parameter.module_template_id));
    }

    // Lookups return the oldest match.
    let lipids = backend.find_template_by_file("lipid").await.unwrap().unwrap();
    assert_eq!(lipids.id, first.templates[0].id);
}

#[tokio::test]
async fn test_out_of_range_position_commits_nothing() {
    let backend = MemoryBackend::new();
    let mut catalog = Catalog::builtin();
    catalog
        .parameters
        .push(ParameterDefinition::positional(7, "supply"));

    let err = seed_catalog(&backend, &catalog).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Referential);
    assert_eq!(
        err,
        SeedError::UnresolvedTemplate {
            parameter: "supply".to_string(),
            reference: "position 7".to_string(),
        }
    );
    assert_eq!(backend.counts().await.unwrap(), CatalogCounts::default());
}

#[tokio::test]
async fn test_unknown_key_commits_nothing() {
    let backend = MemoryBackend::new();
    let mut catalog = Catalog::builtin();
    catalog
        .parameters
        .insert(0, ParameterDefinition::new("ribosome", "k"));

    let err = seed_catalog(&backend, &catalog).await.unwrap_err();
    assert!(err.is_referential());
    assert_eq!(backend.counts().await.unwrap(), CatalogCounts::default());
}

#[tokio::test]
async fn test_storage_failure_during_parameters_rolls_back_templates() {
    // Seven template writes and three parameter writes succeed.
    let backend = MemoryBackend::new().fail_after_writes(10);

    let err = seed_catalog(&backend, &Catalog::builtin()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Persistence);
    assert_eq!(backend.counts().await.unwrap(), CatalogCounts::default());
    assert!(backend.find_template_by_file("lipid").await.unwrap().is_none());
}

#[tokio::test]
async fn test_storage_failure_during_templates_rolls_back() {
    let backend = MemoryBackend::new().fail_after_writes(3);

    let err = seed_catalog(&backend, &Catalog::builtin()).await.unwrap_err();
    assert!(matches!(err, SeedError::Database(_)));
    assert_eq!(backend.counts().await.unwrap(), CatalogCounts::default());
}

#[tokio::test]
async fn test_invalid_catalog_never_touches_storage() {
    // Zero writes allowed: any insert would surface as a persistence error.
    let backend = MemoryBackend::new().fail_after_writes(0);
    let mut catalog = Catalog::builtin();
    catalog.parameters.push(ParameterDefinition::new("dna", "k"));

    let err = seed_catalog(&backend, &catalog).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[tokio::test]
async fn test_manager_seeds_development() {
    let backend = MemoryBackend::new();
    let outcomes = SeederManager::with_module_catalog()
        .run_for_environment(&backend, &Environment::Development)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].seeder, "module_catalog");
    assert_eq!(outcomes[0].created, full_catalog());
    assert_eq!(backend.counts().await.unwrap(), full_catalog());
}

#[tokio::test]
async fn test_manager_refuses_unsafe_environments() {
    let backend = MemoryBackend::new();
    let manager = SeederManager::with_module_catalog();

    for env in [
        Environment::Production,
        Environment::Custom("lab".to_string()),
    ] {
        let err = manager
            .run_for_environment(&backend, &env)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::UnsafeEnvironment(_)));
    }
    assert_eq!(backend.counts().await.unwrap(), CatalogCounts::default());

    manager.run_production_force(&backend).await.unwrap();
    assert_eq!(backend.counts().await.unwrap(), full_catalog());
}

#[tokio::test]
async fn test_seeder_rollback_clears_tables() {
    let backend = MemoryBackend::new();
    let seeder = ModuleCatalogSeeder::new();
    seeder.run(&backend).await.unwrap();
    seeder.run(&backend).await.unwrap();
    assert_eq!(backend.counts().await.unwrap().templates, 14);

    seeder.rollback(&backend).await.unwrap();
    assert_eq!(backend.counts().await.unwrap(), CatalogCounts::default());
}
