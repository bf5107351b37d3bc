use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tax_core::db::{DbConfig, MemoryCollectionFactory, StoreRegistry};
use tax_core::RecordStoreClient;
use tax_data::{GeneratorConfig, PeopleLoader, PersonGenerator};
use tax_db_sqlite::SqliteCollectionFactory;

/// Populate the people collection with generated or imported records.
///
/// Without `--import`, `--count` random people are generated. With
/// `--import`, rows are read from a CSV file with the columns
/// `name,surname,date_of_birth,anual_salary_before_tax`.
#[derive(Parser, Debug)]
#[command(name = "people-generator")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of people to generate
    #[arg(short, long, default_value_t = 500)]
    count: usize,

    /// Seed for reproducible output
    #[arg(short, long)]
    seed: Option<u64>,

    /// Import people from this CSV file instead of generating them
    #[arg(short, long)]
    import: Option<PathBuf>,

    /// Database backend to use
    #[arg(long, default_value = "sqlite")]
    backend: String,

    /// Database connection string (e.g. sqlite:taxes.db?mode=rwc)
    #[arg(long, default_value = "sqlite:taxes.db?mode=rwc")]
    db: String,

    /// Database name
    #[arg(long, default_value = "taxes")]
    database: String,

    /// Collection name
    #[arg(long, default_value = "people")]
    collection: String,

    /// Lowest generated salary
    #[arg(long, default_value = "10000.00")]
    min_salary: Decimal,

    /// Highest generated salary
    #[arg(long, default_value = "9990000.00")]
    max_salary: Decimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let today = Local::now().date_naive();

    let db_config = DbConfig {
        backend: args.backend,
        connection_string: args.db,
        database: args.database,
        collection: args.collection,
    };

    let mut registry = StoreRegistry::new();
    registry.register(Box::new(SqliteCollectionFactory));
    registry.register(Box::new(MemoryCollectionFactory));

    let client = RecordStoreClient::connect(&registry, &db_config)
        .await
        .with_context(|| format!("Failed to connect to {}", db_config.connection_string))?;

    let people = match &args.import {
        Some(path) => {
            info!("Importing people from: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open: {}", path.display()))?;
            PeopleLoader::parse(file, today)
                .with_context(|| format!("Failed to parse CSV: {}", path.display()))?
        }
        None => {
            let config = GeneratorConfig {
                min_salary: args.min_salary,
                max_salary: args.max_salary,
                ..GeneratorConfig::default()
            };
            let mut generator = PersonGenerator::new(&config, args.seed, today)
                .context("Invalid generator settings")?;
            generator
                .generate_many(args.count)
                .context("Failed to generate people")?
        }
    };

    let inserted = PeopleLoader::load(&client, &people)
        .await
        .context("Failed to load people into the database")?;

    info!("Inserted {} people into {}", inserted, client.namespace());

    Ok(())
}
