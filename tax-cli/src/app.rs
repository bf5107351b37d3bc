use tax_core::db::{DbConfig, MemoryCollectionFactory, StoreRegistry};
use tax_core::{RecordStoreClient, StoreError};
use tax_db_sqlite::SqliteCollectionFactory;
use tracing::debug;

/// Build a [`StoreRegistry`] pre-loaded with every backend compiled into this
/// binary.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(SqliteCollectionFactory));
    registry.register(Box::new(MemoryCollectionFactory));
    registry
}

/// Clients for the people collection and, when configured, the tax-card
/// collection next to it.
pub struct Clients {
    pub people: RecordStoreClient,
    pub tax_cards: Option<RecordStoreClient>,
}

/// Connects once; the tax-card client shares the people client's connection.
pub async fn connect(
    registry: &StoreRegistry,
    config: &DbConfig,
    tax_card_collection: Option<&str>,
) -> Result<Clients, StoreError> {
    let people = RecordStoreClient::connect(registry, config).await?;
    let tax_cards = tax_card_collection.map(|name| people.sibling(name));
    debug!(
        people = people.namespace(),
        tax_cards = ?tax_cards.as_ref().map(RecordStoreClient::namespace),
        "store ready"
    );
    Ok(Clients { people, tax_cards })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_knows_both_backends() {
        assert_eq!(build_registry().available_backends(), vec!["memory", "sqlite"]);
    }

    #[tokio::test]
    async fn connect_memory_with_tax_cards() {
        let config = DbConfig {
            backend: "memory".to_string(),
            ..DbConfig::default()
        };

        let clients = connect(&build_registry(), &config, Some("tax_cards"))
            .await
            .expect("memory backend should connect");

        assert_eq!(clients.people.namespace(), "taxes.people");
        assert_eq!(
            clients.tax_cards.as_ref().map(RecordStoreClient::namespace),
            Some("taxes.tax_cards")
        );
    }

    #[tokio::test]
    async fn unknown_backend_fails_at_startup() {
        let config = DbConfig {
            backend: "mongodb".to_string(),
            ..DbConfig::default()
        };

        let result = connect(&build_registry(), &config, None).await;

        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }
}
