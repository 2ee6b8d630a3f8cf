use chrono::{DurationRound, TimeDelta, Utc};
use portfolio_models::contact::{ContactForm, ContactRecord};
use portfolio_store_contracts::{CollectionQuery, MessageStore, StoreError};
use portfolio_store_firestore::{FirestoreMessageStore, FirestoreMessageStoreConfig};
use portfolio_utils::assert_matches;
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

const API_KEY: &str = "test-api-key";
const COLLECTION: &str = "contactMessages";

async fn start_store() -> url::Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(portfolio_testing::store::serve(listener, API_KEY.into()));
    format!("http://{addr}/").parse().unwrap()
}

fn make_store(endpoint: &url::Url, api_key: &str) -> FirestoreMessageStore {
    let config =
        FirestoreMessageStoreConfig::new(endpoint, "portfolio-test", "(default)", api_key).unwrap();
    FirestoreMessageStore::new(config).unwrap()
}

fn record(name: &str, minutes_ago: i64) -> ContactRecord {
    let timestamp = Utc::now().duration_trunc(TimeDelta::seconds(1)).unwrap()
        - TimeDelta::minutes(minutes_ago);
    ContactRecord {
        message: ContactForm {
            name: name.into(),
            email: "alice@example.com".into(),
            message: "Let's collaborate on a project!".into(),
        }
        .validate()
        .unwrap(),
        timestamp,
    }
}

fn newest_first(limit: u32) -> CollectionQuery {
    CollectionQuery {
        order_by: "timestamp".into(),
        direction: portfolio_store_contracts::SortDirection::Descending,
        limit,
    }
}

#[tokio::test]
async fn create_then_query() {
    // Arrange
    let endpoint = start_store().await;
    let sut = make_store(&endpoint, API_KEY);
    let older = record("Alice Chen", 10);
    let newer = record("Bob Smith", 1);

    // Act
    let older_id = sut.create(COLLECTION, &older).await.unwrap();
    let newer_id = sut.create(COLLECTION, &newer).await.unwrap();
    let all = sut.query(COLLECTION, newest_first(50)).await.unwrap();
    let latest = sut.query(COLLECTION, newest_first(1)).await.unwrap();
    let other = sut.query("otherCollection", newest_first(50)).await.unwrap();

    // Assert
    assert_ne!(older_id, newer_id);
    assert_eq!(
        all.iter().map(|stored| &stored.id).collect::<Vec<_>>(),
        [&newer_id, &older_id]
    );
    assert_eq!(all[0].record, newer);
    assert_eq!(all[1].record, older);
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].id, newer_id);
    assert!(other.is_empty());
}

#[tokio::test]
async fn permission_denied() {
    let endpoint = start_store().await;
    let sut = make_store(&endpoint, API_KEY);

    let result = sut
        .create(COLLECTION, &record("fail-permission-denied", 0))
        .await;

    assert_matches!(result, Err(StoreError::PermissionDenied));
}

#[tokio::test]
async fn unavailable() {
    let endpoint = start_store().await;
    let sut = make_store(&endpoint, API_KEY);

    let result = sut.create(COLLECTION, &record("fail-unavailable", 0)).await;

    assert_matches!(result, Err(StoreError::Unavailable));
}

#[tokio::test]
async fn unknown_status() {
    let endpoint = start_store().await;
    let sut = make_store(&endpoint, API_KEY);

    let result = sut.create(COLLECTION, &record("fail-internal", 0)).await;

    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Database submission failed: INTERNAL (500 Internal Server Error): Injected failure"
    );
    assert_matches!(err, StoreError::Unknown(_));
}

#[tokio::test]
async fn invalid_api_key() {
    let endpoint = start_store().await;
    let sut = make_store(&endpoint, "wrong-key");

    let create = sut.create(COLLECTION, &record("Alice Chen", 0)).await;
    let query = sut.query(COLLECTION, newest_first(50)).await;

    assert_matches!(create, Err(StoreError::Unauthenticated));
    assert_matches!(query, Err(StoreError::Unauthenticated));
}

#[tokio::test]
async fn store_not_reachable() {
    // Bind and drop a listener to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let sut = make_store(&format!("http://{addr}/").parse().unwrap(), API_KEY);

    let result = sut.create(COLLECTION, &record("Alice Chen", 0)).await;

    assert_matches!(result, Err(StoreError::Unavailable));
}
