use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "shopfront-cli")]
#[command(about = "Shopfront back-office command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations.
    Migrate,
    /// Seed brands and the category tree from the catalog file.
    Seed {
        /// Catalog YAML path; defaults to the configured catalog path.
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Check database connectivity.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = shopfront_core::load_app_config()?;
    let pool = shopfront_db::connect_pool(
        &config.database_url,
        shopfront_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::Migrate => {
            let applied = shopfront_db::run_migrations(&pool).await?;
            tracing::info!(applied, "migrations complete");
        }
        Commands::Seed { path } => {
            shopfront_db::run_migrations(&pool).await?;
            let path = path.unwrap_or_else(|| config.catalog_path.clone());
            let catalog = shopfront_core::load_catalog(&path)?;
            let (brands, categories) = shopfront_db::seed_catalog(&pool, &catalog).await?;
            tracing::info!(brands, categories, path = %path.display(), "catalog seeded");
        }
        Commands::Health => {
            shopfront_db::health_check(&pool).await?;
            tracing::info!("database reachable");
        }
    }

    Ok(())
}
