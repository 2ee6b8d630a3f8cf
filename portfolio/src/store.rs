use anyhow::Context;
use portfolio_config::StoreConfig;
use portfolio_store_firestore::{FirestoreMessageStore, FirestoreMessageStoreConfig};

/// Set up the client for the remote document store
pub fn connect(config: &StoreConfig) -> anyhow::Result<FirestoreMessageStore> {
    let store_config = FirestoreMessageStoreConfig::new(
        &config.endpoint,
        &config.project_id,
        &config.database,
        &config.api_key,
    )?;
    FirestoreMessageStore::new(store_config).context("Failed to create document store client")
}
