use anyhow::{Context, Result};
use cellsim_catalog::{backends, Catalog, DatabaseConfig};
use serde_json::{json, Value};

/// Print one stored template and its parameters
pub async fn show(database_url: Option<String>, file: &str) -> Result<()> {
    let config = DatabaseConfig::load(database_url).context("Invalid database configuration")?;
    let backend = backends::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.masked_url()))?;

    let template = backend
        .find_template_by_file(file)
        .await?
        .with_context(|| format!("No module template with file '{}'", file))?;
    let parameters = backend.parameters_for_template(template.id).await?;
    backend.close().await;

    println!("📦 {} (id: {})", template.name, template.id);
    println!("   file: {}", template.file);
    println!("   javascript_model: {}", template.javascript_model);
    println!("   created_at: {}", template.created_at.to_rfc3339());
    println!("   parameters ({}):", parameters.len());
    for parameter in &parameters {
        println!("     - {} (id: {})", parameter.key, parameter.id);
    }
    Ok(())
}

/// Built-in definitions grouped by template
pub fn catalog_json(catalog: &Catalog) -> Value {
    let templates: Vec<Value> = catalog
        .templates
        .iter()
        .enumerate()
        .map(|(position, template)| {
            json!({
                "key": template.key,
                "name": template.name,
                "file": template.file,
                "javascript_model": template.javascript_model,
                "parameters": catalog.parameter_keys(position),
            })
        })
        .collect();

    json!({
        "templates": templates,
        "template_count": catalog.templates.len(),
        "parameter_count": catalog.parameters.len(),
    })
}

/// Print the built-in catalog without touching storage
pub fn print(json_output: bool) -> Result<()> {
    let catalog = Catalog::builtin();
    catalog.validate()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&catalog_json(&catalog))?);
        return Ok(());
    }

    println!("📚 Module Catalog");
    println!("=================");
    for (position, template) in catalog.templates.iter().enumerate() {
        println!(
            "{:<18} file: {:<12} model: {:<12} params: {}",
            template.name,
            template.file,
            template.javascript_model,
            catalog.parameter_keys(position).join(", ")
        );
    }
    println!();
    println!(
        "{} templates, {} parameters",
        catalog.templates.len(),
        catalog.parameters.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_json_shape() {
        let value = catalog_json(&Catalog::builtin());
        assert_eq!(value["template_count"], 7);
        assert_eq!(value["parameter_count"], 26);
        assert_eq!(value["templates"][6]["javascript_model"], "CellGrowth");
        assert_eq!(
            value["templates"][6]["parameters"],
            json!(["consume", "infrastructure"])
        );
    }

    #[tokio::test]
    async fn test_show_missing_template() {
        let err = show(Some("memory://".to_string()), "ribosome")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ribosome"));
    }
}
