//! TOML configuration for `tax-manager`.
//!
//! Precedence, highest first: command-line flags, the config file, built-in
//! defaults. The file is `--config`, else `$TAX_MANAGER_CONFIG`, else none.
//!
//! ```toml
//! [store]
//! backend = "sqlite"
//! connection_string = "sqlite:taxes.db?mode=rwc"
//! database = "taxes"
//! collection = "people"
//! tax_card_collection = "tax_cards"
//!
//! [tax]
//! gpm_tax_rate = "0.20"
//! health_tax_rate = "0.15"
//! health_taxable_share = "0.90"
//!
//! [session]
//! pause_ms = 2000
//!
//! [logging]
//! level = "warn"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tax_core::calculations::IncomeTaxConfig;
use tax_core::db::DbConfig;
use thiserror::Error;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "TAX_MANAGER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub backend: String,
    pub connection_string: String,
    pub database: String,
    pub collection: String,
    /// Where computed tax cards are written. Empty disables persistence.
    pub tax_card_collection: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            backend: db.backend,
            connection_string: "sqlite:taxes.db?mode=rwc".to_string(),
            database: db.database,
            collection: db.collection,
            tax_card_collection: "tax_cards".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    /// Pause after showing a result, in milliseconds.
    pub pause_ms: u64,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            pause_ms: 2000,
            min_age: None,
            max_age: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub store: StoreSection,
    pub tax: IncomeTaxConfig,
    pub session: SessionSection,
    pub logging: LoggingSection,
}

/// Values given on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub pause_ms: Option<u64>,
}

impl AppConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Reads `explicit`, or the file named by [`CONFIG_ENV_VAR`], or falls
    /// back to defaults when neither is given.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(
        &mut self,
        overrides: Overrides,
    ) {
        let Overrides {
            backend,
            connection_string,
            database,
            collection,
            min_age,
            max_age,
            pause_ms,
        } = overrides;

        if let Some(backend) = backend {
            self.store.backend = backend;
        }
        if let Some(connection_string) = connection_string {
            self.store.connection_string = connection_string;
        }
        if let Some(database) = database {
            self.store.database = database;
        }
        if let Some(collection) = collection {
            self.store.collection = collection;
        }
        if min_age.is_some() {
            self.session.min_age = min_age;
        }
        if max_age.is_some() {
            self.session.max_age = max_age;
        }
        if let Some(pause_ms) = pause_ms {
            self.session.pause_ms = pause_ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.db_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.tax
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.store.tax_card_collection.contains('.') {
            return Err(ConfigError::Invalid(format!(
                "invalid tax card collection name '{}'",
                self.store.tax_card_collection
            )));
        }
        if self.session.min_age.is_some() != self.session.max_age.is_some() {
            return Err(ConfigError::Invalid(
                "min_age and max_age must be given together".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.store.backend.clone(),
            connection_string: self.store.connection_string.clone(),
            database: self.store.database.clone(),
            collection: self.store.collection.clone(),
        }
    }

    pub fn tax_card_collection(&self) -> Option<&str> {
        let name = self.store.tax_card_collection.trim();
        (!name.is_empty()).then_some(name)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.session.pause_ms)
    }

    /// Age range to use for the first iteration, if one was configured.
    pub fn initial_range(&self) -> Option<(i64, i64)> {
        self.session.min_age.zip(self.session.max_age)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();

        assert_eq!(config.store.backend, "sqlite");
        assert_eq!(config.db_config().namespace(), "taxes.people");
        assert_eq!(config.tax_card_collection(), Some("tax_cards"));
        assert_eq!(config.pause(), Duration::from_secs(2));
        assert_eq!(config.initial_range(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [store]
            backend = "memory"
            tax_card_collection = ""

            [tax]
            gpm_tax_rate = "0.25"

            [session]
            pause_ms = 0
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.collection, "people");
        assert_eq!(config.tax_card_collection(), None);
        assert_eq!(config.tax.gpm_tax_rate, dec!(0.25));
        assert_eq!(config.tax.health_tax_rate, dec!(0.15));
        assert_eq!(config.pause(), Duration::ZERO);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = AppConfig::from_toml("[store]\nhost = \"localhost\"\n");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = AppConfig::from_toml("[store]\ndatabase = \"archive\"\n").unwrap();

        config.apply(Overrides {
            connection_string: Some(":memory:".to_string()),
            min_age: Some(20),
            max_age: Some(30),
            ..Overrides::default()
        });

        assert_eq!(config.store.database, "archive");
        assert_eq!(config.store.connection_string, ":memory:");
        assert_eq!(config.initial_range(), Some((20, 30)));
    }

    #[test]
    fn invalid_rate_is_reported() {
        let config = AppConfig::from_toml("[tax]\nhealth_tax_rate = \"1.5\"\n").unwrap();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn half_a_range_is_invalid() {
        let mut config = AppConfig::default();
        config.apply(Overrides {
            min_age: Some(20),
            ..Overrides::default()
        });

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = AppConfig::from_file(Path::new("/nonexistent/tax-manager.toml"));

        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
