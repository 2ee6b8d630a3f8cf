use anyhow::Context;
use portfolio_config::MailConfig;
use portfolio_mail_impl::{MailClientImpl, MailtoMailClient, SmtpMailClient};

/// Set up the configured mail backend
pub async fn connect(config: &MailConfig) -> anyhow::Result<MailClientImpl> {
    Ok(match config {
        MailConfig::Mailto { opener } => {
            MailClientImpl::Mailto(MailtoMailClient::new(opener.as_deref()))
        }
        MailConfig::Smtp { smtp_url, from } => MailClientImpl::Smtp(
            SmtpMailClient::new(smtp_url, from.clone())
                .await
                .context("Failed to set up SMTP transport")?,
        ),
    })
}
