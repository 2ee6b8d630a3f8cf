use clap::Args;
use portfolio_config::Config;
use portfolio_core_contact_contracts::{
    ContactFeatureService, ContactSubmitError, SubmissionStatus,
};
use portfolio_models::contact::ContactForm;
use tokio::sync::watch;

use crate::environment::Provider;

#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Name of the sender
    #[arg(long, default_value = "")]
    name: String,
    /// Email address of the sender
    #[arg(long, default_value = "")]
    email: String,
    /// The message to send
    #[arg(long, default_value = "")]
    message: String,
}

impl SubmitCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        let provider = Provider::new(&config).await?;
        let contact = provider.contact_feature();

        let printer = tokio::spawn(print_status(contact.status()));

        let mut form = ContactForm {
            name: self.name,
            email: self.email,
            message: self.message,
        };
        let result = contact.submit(&mut form).await;

        match &result {
            Ok(id) => println!("Stored message {id}"),
            Err(ContactSubmitError::Validation(errors)) => {
                for (field, error) in errors.iter() {
                    println!("{field:?}: {error}");
                }
            }
            Err(err) => {
                if let Some(fallback) = err.fallback() {
                    println!("Fallback: {}", fallback.mailto_link());
                }
            }
        }

        // The notification mail is sent in the background after a delay.
        if result.is_ok() {
            tokio::time::sleep(*config.contact.success_mail_delay).await;
            tokio::task::yield_now().await;
        }

        let started = !matches!(
            result,
            Err(ContactSubmitError::Validation(_) | ContactSubmitError::InFlight { .. })
        );
        if started {
            printer.await?;
        } else {
            printer.abort();
        }

        result.map(|_| ()).map_err(Into::into)
    }
}

/// Prints every status change until the status returns to idle.
async fn print_status(mut status: watch::Receiver<SubmissionStatus>) {
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        match current {
            SubmissionStatus::Idle => {
                println!("[idle]");
                break;
            }
            SubmissionStatus::Submitting => println!("[submitting] Sending..."),
            SubmissionStatus::Success(text) => println!("[success] {text}"),
            SubmissionStatus::Error(text) => println!("[error] {text}"),
        }
    }
}
