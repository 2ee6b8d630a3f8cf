use std::{sync::Arc, time::Duration};

use futures::{stream::BoxStream, StreamExt};
use portfolio_core_messages_contracts::{MessagesFeatureService, MessagesSnapshot};
use portfolio_store_contracts::{CollectionQuery, MessageStore, SortDirection, StoreError};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct MessagesFeatureServiceImpl<Store> {
    store: Arc<Store>,
    config: MessagesFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct MessagesFeatureConfig {
    pub collection: Arc<str>,
    pub limit: u32,
    pub poll_interval: Duration,
}

impl<Store: MessageStore> MessagesFeatureServiceImpl<Store> {
    pub fn new(store: Arc<Store>, config: MessagesFeatureConfig) -> Self {
        Self { store, config }
    }

    fn recent_query(&self) -> CollectionQuery {
        CollectionQuery {
            order_by: "timestamp".into(),
            direction: SortDirection::Descending,
            limit: self.config.limit,
        }
    }
}

impl<Store: MessageStore> MessagesFeatureService for MessagesFeatureServiceImpl<Store> {
    #[tracing::instrument(skip(self))]
    async fn list_recent(&self) -> Result<MessagesSnapshot, StoreError> {
        self.store
            .query(&self.config.collection, self.recent_query())
            .await
    }

    fn watch(&self) -> BoxStream<'static, Result<MessagesSnapshot, StoreError>> {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let poller = Poller {
            store: Arc::clone(&self.store),
            collection: Arc::clone(&self.config.collection),
            query: self.recent_query(),
            interval,
            last: None,
            failed: false,
        };

        futures::stream::unfold(poller, |mut poller| async move {
            let item = poller.next_change().await?;
            Some((item, poller))
        })
        .boxed()
    }
}

struct Poller<Store> {
    store: Arc<Store>,
    collection: Arc<str>,
    query: CollectionQuery,
    interval: Interval,
    last: Option<MessagesSnapshot>,
    failed: bool,
}

impl<Store: MessageStore> Poller<Store> {
    async fn next_change(&mut self) -> Option<Result<MessagesSnapshot, StoreError>> {
        if self.failed {
            return None;
        }

        loop {
            self.interval.tick().await;
            match self.store.query(&self.collection, self.query.clone()).await {
                Ok(snapshot) if self.last.as_ref() == Some(&snapshot) => {}
                Ok(snapshot) => {
                    debug!(count = snapshot.len(), "messages changed");
                    self.last = Some(snapshot.clone());
                    return Some(Ok(snapshot));
                }
                Err(err) => {
                    warn!("Failed to poll messages: {err}");
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use portfolio_models::contact::{
        ContactForm, ContactMessageId, ContactRecord, StoredContactRecord,
    };
    use portfolio_store_contracts::MockMessageStore;
    use portfolio_utils::assert_matches;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;

    fn config() -> MessagesFeatureConfig {
        MessagesFeatureConfig {
            collection: "contactMessages".into(),
            limit: 50,
            poll_interval: Duration::from_secs(5),
        }
    }

    fn query() -> CollectionQuery {
        CollectionQuery {
            order_by: "timestamp".into(),
            direction: SortDirection::Descending,
            limit: 50,
        }
    }

    fn stored(id: &str, name: &str, minute: u32) -> StoredContactRecord {
        StoredContactRecord {
            id: ContactMessageId::new(id),
            record: ContactRecord {
                message: ContactForm {
                    name: name.into(),
                    email: "alice@example.com".into(),
                    message: "Let's collaborate on a project!".into(),
                }
                .validate()
                .unwrap(),
                timestamp: Utc.with_ymd_and_hms(2024, 3, 14, 13, minute, 0).unwrap(),
            },
        }
    }

    #[tokio::test]
    async fn list_recent() {
        // Arrange
        let expected = vec![stored("b", "Bob Smith", 40), stored("a", "Alice Chen", 30)];
        let store = MockMessageStore::new().with_query(
            "contactMessages".into(),
            query(),
            Ok(expected.clone()),
        );
        let sut = MessagesFeatureServiceImpl::new(Arc::new(store), config());

        // Act
        let result = sut.list_recent().await;

        // Assert
        assert_eq!(result.unwrap(), expected);
    }

    #[tokio::test]
    async fn list_recent_error() {
        let store = MockMessageStore::new().with_query(
            "contactMessages".into(),
            query(),
            Err(StoreError::FailedPrecondition),
        );
        let sut = MessagesFeatureServiceImpl::new(Arc::new(store), config());

        let result = sut.list_recent().await;

        assert_matches!(result, Err(StoreError::FailedPrecondition));
    }

    #[tokio::test(start_paused = true)]
    async fn watch_emits_changes_until_error() {
        // Arrange
        let alice = stored("a", "Alice Chen", 30);
        let bob = stored("b", "Bob Smith", 40);

        let mut responses = vec![
            Ok(vec![alice.clone()]),
            Ok(vec![alice.clone()]),
            Ok(vec![bob.clone(), alice.clone()]),
            Err(StoreError::Unavailable),
        ]
        .into_iter();
        let mut store = MockMessageStore::new();
        store
            .expect_query()
            .times(4)
            .withf(|collection, q| collection == "contactMessages" && *q == query())
            .returning(move |_, _| Box::pin(std::future::ready(responses.next().unwrap())));

        let sut = MessagesFeatureServiceImpl::new(Arc::new(store), config());
        let start = Instant::now();

        // Act
        let items = sut.watch().collect::<Vec<_>>().await;

        // Assert
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), &vec![alice.clone()]);
        assert_eq!(items[1].as_ref().unwrap(), &vec![bob, alice]);
        assert_matches!(&items[2], Err(StoreError::Unavailable));
        assert!(start.elapsed() >= Duration::from_secs(15));
    }
}
