use std::{collections::BTreeMap, fmt, sync::LazyLock};

use chrono::{DateTime, Utc};
use nutype::nutype;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub static CONTACT_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.\S+$").unwrap());

/// Unvalidated contact form state as entered by a visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: ContactMessageAuthorName,
    pub email: ContactMessageEmail,
    pub content: ContactMessageContent,
}

/// A validated message together with the time it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub message: ContactMessage,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContactRecord {
    pub id: ContactMessageId,
    pub record: ContactRecord,
}

#[nutype(derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    AsRef,
    Deref,
    Display,
    Serialize,
    Deserialize
))]
pub struct ContactMessageId(String);

#[nutype(
    sanitize(trim),
    validate(len_char_min = 2),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Display, Serialize, Deserialize)
)]
pub struct ContactMessageAuthorName(String);

#[nutype(
    validate(regex = CONTACT_EMAIL_REGEX),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Display, Serialize, Deserialize)
)]
pub struct ContactMessageEmail(String);

#[nutype(
    sanitize(trim),
    validate(len_char_min = 10),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Display, Serialize, Deserialize)
)]
pub struct ContactMessageContent(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactFieldError {
    #[error("Name is required")]
    NameRequired,
    #[error("Name must be at least 2 characters")]
    NameTooShort,
    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email address")]
    EmailInvalid,
    #[error("Message is required")]
    MessageRequired,
    #[error("Message must be at least 10 characters")]
    MessageTooShort,
}

impl ContactFieldError {
    pub fn field(self) -> ContactField {
        match self {
            Self::NameRequired | Self::NameTooShort => ContactField::Name,
            Self::EmailRequired | Self::EmailInvalid => ContactField::Email,
            Self::MessageRequired | Self::MessageTooShort => ContactField::Message,
        }
    }
}

/// Every field of a contact form that failed validation, at most one error
/// per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactValidationErrors(BTreeMap<ContactField, ContactFieldError>);

impl ContactValidationErrors {
    pub fn get(&self, field: ContactField) -> Option<ContactFieldError> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContactField, ContactFieldError)> + '_ {
        self.0.iter().map(|(&field, &error)| (field, error))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn record<T>(&mut self, result: Result<T, ContactFieldError>) -> Option<T> {
        result
            .map_err(|error| self.0.insert(error.field(), error))
            .ok()
    }
}

impl fmt::Display for ContactValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, error)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl ContactForm {
    /// Validates all fields at once. Either every field is valid or the
    /// errors of every invalid field are returned.
    pub fn validate(&self) -> Result<ContactMessage, ContactValidationErrors> {
        let mut errors = ContactValidationErrors::default();

        let name = errors.record(validate_name(&self.name));
        let email = errors.record(validate_email(&self.email));
        let content = errors.record(validate_content(&self.message));

        match (name, email, content) {
            (Some(name), Some(email), Some(content)) => Ok(ContactMessage {
                name,
                email,
                content,
            }),
            _ => Err(errors),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.message.is_empty()
    }
}

fn validate_name(name: &str) -> Result<ContactMessageAuthorName, ContactFieldError> {
    if name.trim().is_empty() {
        return Err(ContactFieldError::NameRequired);
    }
    ContactMessageAuthorName::try_new(name.to_owned()).map_err(|_| ContactFieldError::NameTooShort)
}

fn validate_email(email: &str) -> Result<ContactMessageEmail, ContactFieldError> {
    if email.trim().is_empty() {
        return Err(ContactFieldError::EmailRequired);
    }
    ContactMessageEmail::try_new(email.to_owned()).map_err(|_| ContactFieldError::EmailInvalid)
}

fn validate_content(message: &str) -> Result<ContactMessageContent, ContactFieldError> {
    if message.trim().is_empty() {
        return Err(ContactFieldError::MessageRequired);
    }
    ContactMessageContent::try_new(message.to_owned())
        .map_err(|_| ContactFieldError::MessageTooShort)
}
