use std::future::Future;

use futures::stream::BoxStream;
use portfolio_models::contact::StoredContactRecord;
use portfolio_store_contracts::StoreError;

pub type MessagesSnapshot = Vec<StoredContactRecord>;

/// Read-only view of the received contact messages, newest first.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait MessagesFeatureService: Send + Sync + 'static {
    fn list_recent(&self) -> impl Future<Output = Result<MessagesSnapshot, StoreError>> + Send;

    /// Emits the current snapshot and then every change to it. The stream
    /// ends after the first error.
    fn watch(&self) -> BoxStream<'static, Result<MessagesSnapshot, StoreError>>;
}

#[cfg(feature = "mock")]
impl MockMessagesFeatureService {
    pub fn with_list_recent(mut self, result: Result<MessagesSnapshot, StoreError>) -> Self {
        self.expect_list_recent()
            .once()
            .return_once(|| Box::pin(std::future::ready(result)));
        self
    }
}
