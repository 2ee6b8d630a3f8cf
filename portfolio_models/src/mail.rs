use url::form_urlencoded;

use crate::{contact::ContactMessage, email_address::EmailAddress};

/// A pre-filled outgoing mail, handed to the platform mail composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailDraft {
    pub recipient: EmailAddress,
    pub subject: String,
    pub body: String,
    /// The visitor's address, if it is a deliverable mailbox.
    pub reply_to: Option<EmailAddress>,
}

impl MailDraft {
    /// Builds the mail that forwards a contact message to the site owner.
    pub fn contact_notification(
        recipient: EmailAddress,
        owner_name: &str,
        message: &ContactMessage,
    ) -> Self {
        Self {
            recipient,
            subject: format!("Portfolio Contact: Message from {}", *message.name),
            body: format!(
                "Hi {owner_name},\n\nName: {}\nEmail: {}\n\nMessage:\n{}\n\nSent from your \
                 portfolio contact form.",
                *message.name, *message.email, *message.content
            ),
            reply_to: message.email.parse().ok(),
        }
    }

    /// Renders the draft as a `mailto:` link. Subject and body are percent
    /// encoded with spaces as `%20`. Only ASCII alphanumerics and `*-._` stay
    /// literal, so `!'()~` are escaped as well. Mail handlers decode both
    /// forms the same way.
    pub fn mailto_link(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.recipient,
            encode_component(&self.subject),
            encode_component(&self.body)
        )
    }
}

fn encode_component(value: &str) -> String {
    // `byte_serialize` escapes a literal `+` as `%2B`, so every remaining `+`
    // stands for a space.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
