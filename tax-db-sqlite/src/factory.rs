use async_trait::async_trait;

use tax_core::db::{CollectionFactory, DbConfig, DocumentCollection, StoreError};

use crate::collection::SqliteCollection;

/// Turns a connection string into a sqlx SQLite URL.
///
/// * `sqlite:...` URLs pass through unchanged.
/// * `:memory:` or an empty string selects an ephemeral in-memory database.
/// * Anything else is a file path, created if missing.
fn database_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else if trimmed.is_empty() || trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{trimmed}?mode=rwc")
    }
}

/// [`CollectionFactory`] for SQLite.
///
/// Register this with a [`tax_core::db::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use tax_core::db::StoreRegistry;
/// use tax_db_sqlite::SqliteCollectionFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteCollectionFactory));
/// ```
pub struct SqliteCollectionFactory;

#[async_trait]
impl CollectionFactory for SqliteCollectionFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens the database and runs the bundled migrations, so the returned
    /// collection is ready for use.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn DocumentCollection>, StoreError> {
        let url = database_url(&config.connection_string);
        let collection = SqliteCollection::connect(&url, &config.namespace()).await?;
        collection.run_migrations().await?;
        Ok(Box::new(collection))
    }
}
