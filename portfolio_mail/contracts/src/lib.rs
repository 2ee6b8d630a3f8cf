use std::future::Future;

pub use portfolio_models::mail::MailDraft;

/// Hands a pre-filled mail to whatever delivers it. Delivery problems are
/// logged by the implementation and never reported back.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait MailClient: Send + Sync + 'static {
    fn compose(&self, draft: MailDraft) -> impl Future<Output = ()> + Send;
}

#[cfg(feature = "mock")]
impl MockMailClient {
    pub fn with_compose(mut self, draft: MailDraft) -> Self {
        self.expect_compose()
            .once()
            .with(mockall::predicate::eq(draft))
            .return_once(|_| Box::pin(std::future::ready(())));
        self
    }
}
