use std::future::Future;

use portfolio_models::{
    contact::{ContactForm, ContactMessageId, ContactValidationErrors},
    mail::MailDraft,
};
use portfolio_store_contracts::StoreError;
use thiserror::Error;
use tokio::sync::watch;

pub const SUCCESS_MESSAGE: &str = "Message sent successfully! I'll get back to you soon.";

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Validates and submits the contact form.
    ///
    /// On success the form is reset and the owner additionally gets a
    /// notification mail. If the message cannot be stored in time, the
    /// fallback mail is composed instead and returned in the error.
    /// Resubmitting a message that is still in flight is rejected. Once
    /// validation passed, the submission concludes even if the returned
    /// future is dropped.
    fn submit(
        &self,
        form: &mut ContactForm,
    ) -> impl Future<Output = Result<ContactMessageId, ContactSubmitError>> + Send;

    /// Subscribes to the status shown next to the form.
    fn status(&self) -> watch::Receiver<SubmissionStatus>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Success(String),
    Error(String),
}

impl SubmissionStatus {
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

#[derive(Debug, Error)]
pub enum ContactSubmitError {
    #[error("{0}")]
    Validation(ContactValidationErrors),
    #[error("Database error: {source}. Opening email...")]
    Persist {
        source: StoreError,
        fallback: MailDraft,
    },
    #[error("Request timeout. Falling back to email...")]
    Timeout { fallback: MailDraft },
    /// An identical message from the same form is still being submitted.
    #[error("A submission is already in progress.")]
    InFlight { fallback: MailDraft },
}

impl ContactSubmitError {
    /// The mail that can be sent instead of storing the message. For
    /// `Persist` and `Timeout` it has already been composed.
    pub fn fallback(&self) -> Option<&MailDraft> {
        match self {
            Self::Persist { fallback, .. }
            | Self::Timeout { fallback }
            | Self::InFlight { fallback } => Some(fallback),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_submit(
        mut self,
        form: ContactForm,
        result: Result<ContactMessageId, ContactSubmitError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(mockall::predicate::eq(form))
            .return_once(|_| Box::pin(std::future::ready(result)));
        self
    }
}
