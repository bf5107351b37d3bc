use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use tax_cli::prompt::Prompter;
use tax_cli::{AppConfig, Overrides, SessionConfig, TaxSession, app, logging};
use tax_core::calculations::IncomeTaxCalculator;

/// Browse people by age range and compute their income tax.
///
/// Settings come from an optional TOML file (`--config`, or the path in
/// `TAX_MANAGER_CONFIG`); flags given here override it.
#[derive(Debug, Parser)]
#[command(name = "tax-manager")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database backend to use (`sqlite` or `memory`).
    #[arg(long)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite a sqlx URL (`sqlite:taxes.db?mode=rwc`), a file path or `:memory:`.
    #[arg(long)]
    db: Option<String>,

    /// Database name.
    #[arg(long)]
    database: Option<String>,

    /// Collection holding the people.
    #[arg(long)]
    collection: Option<String>,

    /// Minimal age for the first query.
    #[arg(long, requires = "max_age", allow_negative_numbers = true)]
    min_age: Option<i64>,

    /// Maximal age for the first query.
    #[arg(long, requires = "min_age", allow_negative_numbers = true)]
    max_age: Option<i64>,

    /// Pause after each result, in milliseconds.
    #[arg(long)]
    pause_ms: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
            database: self.database.clone(),
            collection: self.collection.clone(),
            min_age: self.min_age,
            max_age: self.max_age,
            pause_ms: self.pause_ms,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply(cli.overrides());

    logging::init_logging(&config.logging.level);
    config.validate().context("Invalid configuration")?;

    let db_config = config.db_config();
    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let clients = app::connect(&registry, &db_config, config.tax_card_collection())
        .await
        .with_context(|| format!("Failed to connect to {}", db_config.connection_string))?;

    let session_config = SessionConfig {
        pause: config.pause(),
        initial_range: config.initial_range(),
    };
    let prompter = Prompter::new(io::stdin().lock(), io::stdout());
    let mut session = TaxSession::new(
        clients.people,
        IncomeTaxCalculator::new(config.tax.clone()),
        session_config,
        prompter,
    );
    if let Some(tax_cards) = clients.tax_cards {
        session = session.with_tax_cards(tax_cards);
    }

    session.run().await.context("Session aborted")?;
    Ok(())
}
