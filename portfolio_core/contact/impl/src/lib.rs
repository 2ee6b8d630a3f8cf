use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use portfolio_core_contact_contracts::{
    ContactFeatureService, ContactSubmitError, SubmissionStatus, SUCCESS_MESSAGE,
};
use portfolio_mail_contracts::{MailClient, MailDraft};
use portfolio_models::{
    contact::{ContactForm, ContactMessage, ContactMessageId, ContactRecord},
    email_address::EmailAddress,
};
use portfolio_shared_contracts::time::TimeService;
use portfolio_store_contracts::{MessageStore, StoreError};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn, Instrument};

#[derive(Debug, Clone)]
pub struct ContactFeatureServiceImpl<Time, Store, Mail> {
    time: Time,
    flow: Flow<Store, Mail>,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    pub recipient: EmailAddress,
    pub owner_name: Arc<str>,
    pub collection: Arc<str>,
    /// How long to wait for the store before falling back to mail.
    pub timeout: Duration,
    /// Delay before the notification mail after a successful write.
    pub success_mail_delay: Duration,
    /// How long an outcome stays visible before the status resets to idle.
    pub status_display: Duration,
}

#[derive(Debug)]
struct SubmissionState {
    status: watch::Sender<SubmissionStatus>,
    /// Bumped on every status change, so a pending reset only clears the
    /// status it was scheduled for.
    generation: AtomicU64,
    /// Messages whose submission has not concluded yet.
    pending: Mutex<Vec<ContactMessage>>,
}

impl SubmissionState {
    fn set_status(&self, status: SubmissionStatus) -> u64 {
        let mut generation = 0;
        self.status.send_modify(|current| {
            generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            *current = status;
        });
        generation
    }

    /// Drops a displayed outcome early. A running submission keeps its
    /// indicator.
    fn clear_outcome(&self) {
        self.status.send_if_modified(|current| {
            let clear = !current.is_submitting() && *current != SubmissionStatus::Idle;
            if clear {
                self.generation.fetch_add(1, Ordering::AcqRel);
                *current = SubmissionStatus::Idle;
            }
            clear
        });
    }
}

/// The part of a submission that runs after validation, detached from the
/// caller so that it concludes even if the caller goes away.
#[derive(Debug)]
struct Flow<Store, Mail> {
    store: Arc<Store>,
    mail: Arc<Mail>,
    config: ContactFeatureConfig,
    state: Arc<SubmissionState>,
}

impl<Store, Mail> Clone for Flow<Store, Mail> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mail: Arc::clone(&self.mail),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<Time, Store, Mail> ContactFeatureServiceImpl<Time, Store, Mail>
where
    Time: TimeService,
    Store: MessageStore,
    Mail: MailClient,
{
    pub fn new(time: Time, store: Arc<Store>, mail: Arc<Mail>, config: ContactFeatureConfig) -> Self {
        Self {
            time,
            flow: Flow {
                store,
                mail,
                config,
                state: Arc::new(SubmissionState {
                    status: watch::channel(SubmissionStatus::Idle).0,
                    generation: AtomicU64::new(0),
                    pending: Mutex::default(),
                }),
            },
        }
    }
}

impl<Store, Mail> Flow<Store, Mail>
where
    Store: MessageStore,
    Mail: MailClient,
{
    async fn run(
        self,
        record: ContactRecord,
        draft: MailDraft,
        _pending: PendingGuard,
    ) -> Result<ContactMessageId, ContactSubmitError> {
        let err = match self.persist(record).await {
            Some(Ok(id)) => {
                info!(%id, "Contact message stored");
                self.conclude(SubmissionStatus::Success(SUCCESS_MESSAGE.into()));
                self.notify_later(draft);
                return Ok(id);
            }
            Some(Err(source)) => {
                warn!("Failed to store contact message: {source}");
                ContactSubmitError::Persist {
                    source,
                    fallback: draft.clone(),
                }
            }
            None => {
                warn!(timeout = ?self.config.timeout, "Storing contact message timed out");
                ContactSubmitError::Timeout {
                    fallback: draft.clone(),
                }
            }
        };

        self.conclude(SubmissionStatus::Error(err.to_string()));
        self.mail.compose(draft).await;
        Err(err)
    }

    /// Writes the record in its own task and waits for it at most
    /// `config.timeout`. Returns `None` if the timeout fired first.
    async fn persist(&self, record: ContactRecord) -> Option<Result<ContactMessageId, StoreError>> {
        let store = Arc::clone(&self.store);
        let collection = Arc::clone(&self.config.collection);
        let mut write: JoinHandle<_> = tokio::spawn(
            async move { store.create(&collection, &record).await }.in_current_span(),
        );

        tokio::select! {
            biased;
            result = &mut write => Some(result.unwrap_or_else(|err| {
                Err(anyhow::Error::new(err).context("Store write task failed").into())
            })),
            () = tokio::time::sleep(self.config.timeout) => {
                tokio::spawn(discard_late_result(write).in_current_span());
                None
            }
        }
    }

    /// Shows the outcome of a submission and schedules its dismissal.
    fn conclude(&self, status: SubmissionStatus) {
        let generation = self.state.set_status(status);
        let state = Arc::clone(&self.state);
        let display = self.config.status_display;

        tokio::spawn(async move {
            tokio::time::sleep(display).await;
            state.status.send_if_modified(|current| {
                let unchanged = state.generation.load(Ordering::Acquire) == generation;
                if unchanged {
                    *current = SubmissionStatus::Idle;
                }
                unchanged
            });
        });
    }

    fn notify_later(&self, draft: MailDraft) {
        let mail = Arc::clone(&self.mail);
        let delay = self.config.success_mail_delay;

        tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                mail.compose(draft).await;
            }
            .in_current_span(),
        );
    }
}

impl<Time, Store, Mail> ContactFeatureService for ContactFeatureServiceImpl<Time, Store, Mail>
where
    Time: TimeService,
    Store: MessageStore,
    Mail: MailClient,
{
    #[tracing::instrument(skip_all)]
    async fn submit(&self, form: &mut ContactForm) -> Result<ContactMessageId, ContactSubmitError> {
        let state = &self.flow.state;
        let config = &self.flow.config;

        let message = match form.validate() {
            Ok(message) => message,
            Err(errors) => {
                debug!(%errors, "Contact form is invalid");
                state.clear_outcome();
                return Err(ContactSubmitError::Validation(errors));
            }
        };

        let draft =
            MailDraft::contact_notification(config.recipient.clone(), &config.owner_name, &message);

        let Some(pending) = PendingGuard::acquire(state, &message) else {
            debug!("Rejecting a duplicate of a submission in flight");
            return Err(ContactSubmitError::InFlight { fallback: draft });
        };

        state.set_status(SubmissionStatus::Submitting);

        let record = ContactRecord {
            message,
            timestamp: self.time.now(),
        };

        let flow = self.flow.clone();
        let fallback = draft.clone();
        let result = tokio::spawn(flow.run(record, draft, pending).in_current_span())
            .await
            .unwrap_or_else(|err| {
                error!("Contact submission task failed: {err}");
                let err = ContactSubmitError::Persist {
                    source: anyhow::Error::new(err)
                        .context("Contact submission task failed")
                        .into(),
                    fallback,
                };
                self.flow.conclude(SubmissionStatus::Error(err.to_string()));
                Err(err)
            });

        if result.is_ok() {
            *form = ContactForm::default();
        }
        result
    }

    fn status(&self) -> watch::Receiver<SubmissionStatus> {
        self.flow.state.status.subscribe()
    }
}

async fn discard_late_result(write: JoinHandle<Result<ContactMessageId, StoreError>>) {
    match write.await {
        Ok(Ok(id)) => debug!(%id, "Discarding store response that arrived after the timeout"),
        Ok(Err(err)) => debug!("Discarding store error that arrived after the timeout: {err}"),
        Err(err) => debug!("Store write task failed after the timeout: {err}"),
    }
}

/// Marks a message as pending until the guard is dropped.
struct PendingGuard {
    state: Arc<SubmissionState>,
    message: ContactMessage,
}

impl PendingGuard {
    fn acquire(state: &Arc<SubmissionState>, message: &ContactMessage) -> Option<Self> {
        let mut pending = state.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.contains(message) {
            return None;
        }
        pending.push(message.clone());

        Some(Self {
            state: Arc::clone(state),
            message: message.clone(),
        })
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = self
            .state
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(idx) = pending.iter().position(|m| *m == self.message) {
            pending.swap_remove(idx);
        }
    }
}
