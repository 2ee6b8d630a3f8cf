//! Wire format of the REST document API.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use portfolio_models::contact::{
    ContactForm, ContactMessageId, ContactRecord, StoredContactRecord,
};
use portfolio_store_contracts::{CollectionQuery, SortDirection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Document {
    /// Full resource name, assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: ContactFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ContactFields {
    pub name: StringValue,
    pub email: StringValue,
    pub message: StringValue,
    pub timestamp: TimestampValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StringValue {
    pub string_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TimestampValue {
    pub timestamp_value: DateTime<Utc>,
}

impl StringValue {
    fn new(value: &str) -> Self {
        Self {
            string_value: value.into(),
        }
    }
}

impl Document {
    pub fn from_record(record: &ContactRecord) -> Self {
        Self {
            name: None,
            fields: ContactFields {
                name: StringValue::new(&record.message.name),
                email: StringValue::new(&record.message.email),
                message: StringValue::new(&record.message.content),
                timestamp: TimestampValue {
                    timestamp_value: record.timestamp,
                },
            },
        }
    }

    /// The document id is the last segment of the resource name.
    pub fn id(&self) -> Option<ContactMessageId> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(|id| ContactMessageId::new(id.to_owned()))
    }

    pub fn into_record(self) -> anyhow::Result<StoredContactRecord> {
        let id = self
            .id()
            .ok_or_else(|| anyhow!("Document has no resource name"))?;

        let message = ContactForm {
            name: self.fields.name.string_value,
            email: self.fields.email.string_value,
            message: self.fields.message.string_value,
        }
        .validate()
        .map_err(|errors| anyhow!("{errors}"))
        .with_context(|| format!("Document {} is not a valid contact message", *id))?;

        Ok(StoredContactRecord {
            id,
            record: ContactRecord {
                message,
                timestamp: self.fields.timestamp.timestamp_value,
            },
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunQueryRequest<'a> {
    pub structured_query: StructuredQuery<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StructuredQuery<'a> {
    pub from: [CollectionSelector<'a>; 1],
    pub order_by: [Order<'a>; 1],
    pub limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionSelector<'a> {
    pub collection_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Order<'a> {
    pub field: FieldReference<'a>,
    pub direction: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldReference<'a> {
    pub field_path: &'a str,
}

impl<'a> RunQueryRequest<'a> {
    pub fn new(collection: &'a str, query: &'a CollectionQuery) -> Self {
        Self {
            structured_query: StructuredQuery {
                from: [CollectionSelector {
                    collection_id: collection,
                }],
                order_by: [Order {
                    field: FieldReference {
                        field_path: &query.order_by,
                    },
                    direction: match query.direction {
                        SortDirection::Ascending => "ASCENDING",
                        SortDirection::Descending => "DESCENDING",
                    },
                }],
                limit: query.limit,
            },
        }
    }
}

/// One element of the `runQuery` response array. Elements without a
/// document only carry progress information.
#[derive(Debug, Deserialize)]
pub(crate) struct RunQueryResponseEntry {
    #[serde(default)]
    pub document: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorStatus {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
