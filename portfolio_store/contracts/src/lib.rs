use std::future::Future;

use portfolio_models::contact::{ContactMessageId, ContactRecord, StoredContactRecord};
use thiserror::Error;

/// A schema-less document database holding contact messages.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait MessageStore: Send + Sync + 'static {
    /// Appends a new record to `collection` and returns the id the store
    /// assigned to it.
    fn create(
        &self,
        collection: &str,
        record: &ContactRecord,
    ) -> impl Future<Output = Result<ContactMessageId, StoreError>> + Send;

    /// Returns the records of `collection` in the requested order.
    fn query(
        &self,
        collection: &str,
        query: CollectionQuery,
    ) -> impl Future<Output = Result<Vec<StoredContactRecord>, StoreError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub order_by: String,
    pub direction: SortDirection,
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Failure categories reported by a [`MessageStore`]. The adapter decides
/// the category, the message is meant for the visitor.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Permission denied: Check security rules")]
    PermissionDenied,
    #[error("Service unavailable: Network or server issue")]
    Unavailable,
    #[error("Invalid data format: Check form data structure")]
    InvalidArgument,
    #[error("Collection not found: Check project configuration")]
    NotFound,
    #[error("Authentication error: Check API key configuration")]
    Unauthenticated,
    #[error("Failed precondition: Check database indexes")]
    FailedPrecondition,
    #[error("Quota exceeded: Usage limits reached")]
    QuotaExceeded,
    #[error("Request cancelled: Operation timeout or network issue")]
    Cancelled,
    #[error("Database submission failed: {0:#}")]
    Unknown(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockMessageStore {
    pub fn with_create(
        mut self,
        collection: String,
        record: ContactRecord,
        result: Result<ContactMessageId, StoreError>,
    ) -> Self {
        self.expect_create()
            .once()
            .with(
                mockall::predicate::eq(collection),
                mockall::predicate::eq(record),
            )
            .return_once(move |_, _| Box::pin(std::future::ready(result)));
        self
    }

    pub fn with_query(
        mut self,
        collection: String,
        query: CollectionQuery,
        result: Result<Vec<StoredContactRecord>, StoreError>,
    ) -> Self {
        self.expect_query()
            .once()
            .with(
                mockall::predicate::eq(collection),
                mockall::predicate::eq(query),
            )
            .return_once(move |_, _| Box::pin(std::future::ready(result)));
        self
    }
}
