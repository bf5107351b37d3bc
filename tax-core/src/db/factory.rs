use std::collections::HashMap;

use async_trait::async_trait;

use super::store::{DocumentCollection, StoreError};

/// Backend-agnostic store configuration.
///
/// `backend` must match the [`CollectionFactory::backend_name`] of a
/// registered factory. `connection_string` is passed through to that
/// factory unchanged; its meaning is backend-specific.
///
/// | backend    | connection_string examples                     |
/// |------------|------------------------------------------------|
/// | `sqlite`   | `sqlite:taxes.db?mode=rwc`, `sqlite::memory:`  |
/// | `memory`   | ignored                                        |
///
/// `database` and `collection` together name the collection the factory
/// binds to (`taxes.people` by default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
    pub database: String,
    pub collection: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "sqlite::memory:".to_string(),
            database: "taxes".to_string(),
            collection: "people".to_string(),
        }
    }
}

impl DbConfig {
    /// `<database>.<collection>`.
    pub fn namespace(&self) -> String {
        namespace(&self.database, &self.collection)
    }

    /// Rejects empty names and names containing a dot.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (what, name) in [("database", &self.database), ("collection", &self.collection)] {
            if name.trim().is_empty() || name.contains('.') {
                return Err(StoreError::Configuration(format!(
                    "invalid {what} name '{name}'"
                )));
            }
        }
        Ok(())
    }
}

pub fn namespace(
    database: &str,
    collection: &str,
) -> String {
    format!("{database}.{collection}")
}

/// Database name part of a `<database>.<collection>` namespace.
pub fn database_of(namespace: &str) -> &str {
    namespace.split_once('.').map_or(namespace, |(db, _)| db)
}

/// One implementation per storage backend. Each backend crate exports a
/// unit struct implementing this trait, registered with a
/// [`StoreRegistry`] at startup.
#[async_trait]
pub trait CollectionFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open the connection and return the configured collection. Failing to
    /// reach the backend is reported here, never later.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn DocumentCollection>, StoreError>;
}

/// Registry of [`CollectionFactory`] instances, keyed by backend name.
pub struct StoreRegistry {
    factories: HashMap<&'static str, Box<dyn CollectionFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn CollectionFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`StoreError::Configuration`] if a name is invalid or no factory is
    ///   registered for the requested backend.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn DocumentCollection>, StoreError> {
        config.validate()?;
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                StoreError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
