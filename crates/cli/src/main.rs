mod commands;
mod logging;

use clap::{Parser, Subcommand};
use commands::*;
use logging::LoggingConfig;

#[derive(Parser, Debug)]
#[command(name = "cellsim")]
#[command(about = "Schema, seeding and inspection of the cell simulation module catalogs")]
#[command(version)]
struct Cli {
    /// Database URL (postgres://… or memory://); overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Full filter directive, e.g. "cellsim_catalog=debug,sqlx=info"; replaces --log-level
    #[arg(long, global = true)]
    log_filter: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the module_templates and module_parameters tables
    Migrate,

    /// Load the module catalogs
    Seed {
        /// Environment to run seeders for (development, testing, staging, production)
        #[arg(long, short)]
        env: Option<String>,

        /// Force run seeders in production environment
        #[arg(long)]
        force: bool,

        /// Seed an in-memory store instead of the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Show connection health and catalog row counts
    Status,

    /// Show a stored template and its parameters
    Show {
        /// Template file slug, e.g. "lipid"
        file: String,
    },

    /// Print the built-in catalog definitions
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every template and parameter
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

fn logging_config(cli: &Cli) -> LoggingConfig {
    let config = LoggingConfig::new(&cli.log_level, cli.json_logs);
    match &cli.log_filter {
        Some(filter) => config.with_env_filter(filter),
        None => config,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&logging_config(&cli))?;

    let database_url = cli.database_url;
    match cli.command {
        Commands::Migrate => {
            db::migrate(database_url).await?;
        }
        Commands::Seed {
            env,
            force,
            dry_run,
        } => {
            db::seed(database_url, env, force, dry_run).await?;
        }
        Commands::Status => {
            db::status(database_url).await?;
        }
        Commands::Show { file } => {
            catalog::show(database_url, &file).await?;
        }
        Commands::Catalog { json } => {
            catalog::print(json)?;
        }
        Commands::Reset { force } => {
            db::reset(database_url, force).await?;
        }
    }

    Ok(())
}
