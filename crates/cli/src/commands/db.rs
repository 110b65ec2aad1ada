use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cellsim_catalog::{
    backends, CatalogBackend, DatabaseConfig, Environment, MemoryBackend, SeederManager,
    SeederOutcome,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Connection settings and target environment for one CLI invocation
pub struct DatabaseManager {
    config: DatabaseConfig,
}

impl DatabaseManager {
    /// Resolve configuration; explicit flags win over environment variables
    pub fn new(database_url: Option<String>, env: Option<&str>) -> Result<Self> {
        let mut config =
            DatabaseConfig::load(database_url).context("Invalid database configuration")?;

        if let Some(env) = env {
            config.environment = env
                .parse::<Environment>()
                .context("Invalid --env value")?;
        }

        Ok(Self { config })
    }

    pub fn environment(&self) -> &Environment {
        &self.config.environment
    }

    /// Database URL with the password masked
    pub fn connection_info(&self) -> String {
        self.config.masked_url()
    }

    async fn connect(&self) -> Result<Arc<dyn CatalogBackend>> {
        backends::connect(&self.config)
            .await
            .with_context(|| format!("Failed to connect to {}", self.connection_info()))
    }

    /// Prompt for confirmation on destructive operations
    async fn confirm_destructive_operation(&self, operation: &str) -> Result<bool> {
        if !self.environment().is_safe_for_seeding() {
            println!(
                "⚠️  WARNING: Running {} in {} environment!",
                operation,
                self.environment()
            );
        }
        println!("   This operation will permanently delete the module catalogs.");

        print!("   Are you sure you want to continue? (y/N): ");
        tokio::io::stdout().flush().await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let response = lines
            .next_line()
            .await?
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        Ok(matches!(response.as_str(), "y" | "yes"))
    }
}

/// Create the catalog tables
pub async fn migrate(database_url: Option<String>) -> Result<()> {
    let manager = DatabaseManager::new(database_url, None)?;
    println!("🗄️  Catalog Schema");
    println!("Connection: {}", manager.connection_info());

    let backend = manager.connect().await?;
    backend.migrate().await.context("Schema migration failed")?;
    backend.close().await;

    println!("✅ Schema: module_templates, module_parameters up to date");
    Ok(())
}

/// Run the seeders for the selected environment
pub async fn seed(
    database_url: Option<String>,
    env: Option<String>,
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let manager = DatabaseManager::new(database_url, env.as_deref())?;
    let environment = manager.environment().clone();
    let seeders = SeederManager::with_module_catalog();

    println!("🌱 Database Seeding");
    println!("==================");
    println!("Environment: {}", environment);
    if dry_run {
        println!("Target: in-memory store (dry run)");
    } else {
        println!("Connection: {}", manager.connection_info());
    }
    println!("Seeders: {}", seeders.plan(&environment)?.join(", "));
    println!();

    if environment == Environment::Production && !force {
        bail!("Cannot run seeders in production environment without --force flag");
    }

    let backend: Arc<dyn CatalogBackend> = if dry_run {
        Arc::new(MemoryBackend::new())
    } else {
        manager.connect().await?
    };

    let outcomes = match environment {
        Environment::Production => {
            println!("⚠️  WARNING: Running seeders in PRODUCTION environment!");
            println!("This operation will modify production data.");
            println!();
            seeders
                .run_production_force(backend.as_ref())
                .await
                .context("Production seeding failed")?
        }
        _ => seeders
            .run_for_environment(backend.as_ref(), &environment)
            .await
            .context("Seeding failed")?,
    };

    backend.close().await;
    print_outcomes(&outcomes);

    if dry_run {
        println!("✅ Dry run completed; nothing was written");
    } else {
        println!("✅ Database seeding completed successfully");
    }
    Ok(())
}

fn print_outcomes(outcomes: &[SeederOutcome]) {
    for outcome in outcomes {
        println!(
            "   {}: {} templates, {} parameters",
            outcome.seeder, outcome.created.templates, outcome.created.parameters
        );
    }
}

fn safety_label(environment: &Environment) -> &'static str {
    match environment {
        Environment::Production => "⚠️  Unsafe (requires --force)",
        Environment::Custom(_) => "❌ Refused (custom environments are never seeded)",
        _ => "✅ Safe",
    }
}

/// Health check and row counts
pub async fn status(database_url: Option<String>) -> Result<()> {
    let manager = DatabaseManager::new(database_url, None)?;
    let environment = manager.environment();

    println!("🗄️  Catalog Status");
    println!();
    println!("Environment: {}", environment);
    println!("Environment Safety Check: {}", safety_label(environment));

    let backend = manager.connect().await?;
    match backend.health_check().await {
        Ok(duration) => {
            println!("✅ Connection: {}", manager.connection_info());
            println!("✅ Health Check: Passed ({:?})", duration);
        }
        Err(e) => {
            println!("❌ Connection: {}", manager.connection_info());
            println!("❌ Health Check: FAILED ({})", e);
            bail!("Database health check failed: {}", e);
        }
    }

    let counts = backend
        .counts()
        .await
        .context("Failed to count catalog rows; run `cellsim migrate` first")?;
    println!("📊 module_templates: {}", counts.templates);
    println!("📊 module_parameters: {}", counts.parameters);

    backend.close().await;
    Ok(())
}

/// Delete every template and parameter
pub async fn reset(database_url: Option<String>, force: bool) -> Result<()> {
    let manager = DatabaseManager::new(database_url, None)?;

    println!("🔄 Resetting Module Catalogs");
    println!("Environment: {}", manager.environment());

    if !force && !manager.confirm_destructive_operation("catalog reset").await? {
        println!("Operation cancelled");
        return Ok(());
    }

    let backend = manager.connect().await?;
    let removed = backend.clear().await.context("Failed to clear catalogs")?;
    backend.close().await;

    println!(
        "✅ Removed {} templates and {} parameters",
        removed.templates, removed.parameters
    );
    Ok(())
}
