use portfolio_mail_contracts::{MailClient, MailDraft};

pub use crate::{mailto::MailtoMailClient, smtp::SmtpMailClient};

pub mod mailto;
pub mod smtp;

/// The mail backend selected by configuration.
#[derive(Debug, Clone)]
pub enum MailClientImpl {
    Mailto(MailtoMailClient),
    Smtp(SmtpMailClient),
}

impl MailClient for MailClientImpl {
    async fn compose(&self, draft: MailDraft) {
        match self {
            Self::Mailto(client) => client.compose(draft).await,
            Self::Smtp(client) => client.compose(draft).await,
        }
    }
}
