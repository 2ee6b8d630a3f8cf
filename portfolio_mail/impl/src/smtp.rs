use anyhow::ensure;
use lettre::{
    message::{header::ContentType, Mailbox},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use portfolio_mail_contracts::{MailClient, MailDraft};
use portfolio_models::email_address::EmailAddress;
use portfolio_utils::Apply;
use tracing::{info, warn};

/// Delivers drafts through an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpMailClient {
    from: EmailAddress,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailClient {
    pub async fn new(url: &str, from: EmailAddress) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(url)?.build();

        Ok(Self { from, transport })
    }

    fn message(&self, draft: MailDraft) -> anyhow::Result<Message> {
        Message::builder()
            .from(Mailbox::new(None, self.from.0.clone()))
            .to(Mailbox::new(None, draft.recipient.0))
            .apply_map(draft.reply_to, |builder, reply_to| {
                builder.reply_to(Mailbox::new(None, reply_to.0))
            })
            .subject(draft.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(draft.body)
            .map_err(Into::into)
    }

    async fn send(&self, draft: MailDraft) -> anyhow::Result<()> {
        let message = self.message(draft)?;
        let response = self.transport.send(message).await?;
        ensure!(
            response.is_positive(),
            "SMTP relay rejected the mail: {}",
            response.code()
        );
        Ok(())
    }
}

impl MailClient for SmtpMailClient {
    #[tracing::instrument(skip_all, fields(recipient = %draft.recipient))]
    async fn compose(&self, draft: MailDraft) {
        match self.send(draft).await {
            Ok(()) => info!("Mail delivered to relay"),
            Err(err) => warn!("Failed to deliver mail: {err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(reply_to: Option<&str>) -> MailDraft {
        MailDraft {
            recipient: "owner@example.com".parse().unwrap(),
            subject: "Portfolio Contact: Message from Alice Chen".into(),
            body: "Hi Sam,\n\nName: Alice Chen".into(),
            reply_to: reply_to.map(|addr| addr.parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn message_headers() {
        let sut = SmtpMailClient::new("smtp://localhost:2525", "portfolio@example.com".parse().unwrap())
            .await
            .unwrap();

        let message = sut.message(draft(Some("alice@example.com"))).unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("From: portfolio@example.com\r\n"));
        assert!(formatted.contains("To: owner@example.com\r\n"));
        assert!(formatted.contains("Reply-To: alice@example.com\r\n"));
        assert!(formatted.contains("Subject: Portfolio Contact: Message from Alice Chen\r\n"));
    }

    #[tokio::test]
    async fn message_without_reply_to() {
        let sut = SmtpMailClient::new("smtp://localhost:2525", "portfolio@example.com".parse().unwrap())
            .await
            .unwrap();

        let message = sut.message(draft(None)).unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(!formatted.contains("Reply-To:"));
    }
}
