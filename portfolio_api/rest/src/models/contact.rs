use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use portfolio_models::contact::{
    ContactField, ContactForm, ContactMessageId, ContactValidationErrors, StoredContactRecord,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl From<ApiContactForm> for ContactForm {
    fn from(value: ApiContactForm) -> Self {
        Self {
            name: value.name,
            email: value.email,
            message: value.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiContactSubmitted {
    pub id: ContactMessageId,
}

#[derive(Debug, Serialize)]
pub struct ApiValidationError {
    pub detail: String,
    /// Message per invalid field
    pub errors: BTreeMap<ContactField, String>,
}

impl From<&ContactValidationErrors> for ApiValidationError {
    fn from(value: &ContactValidationErrors) -> Self {
        Self {
            detail: "Invalid contact form".into(),
            errors: value
                .iter()
                .map(|(field, error)| (field, error.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiFallback {
    pub detail: String,
    /// `mailto:` link with the pre-filled message
    pub fallback: String,
}

#[derive(Debug, Serialize)]
pub struct ApiContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<StoredContactRecord> for ApiContactMessage {
    fn from(value: StoredContactRecord) -> Self {
        let message = value.record.message;
        Self {
            id: value.id,
            name: message.name.into_inner(),
            email: message.email.into_inner(),
            message: message.content.into_inner(),
            timestamp: value.record.timestamp,
        }
    }
}
