use std::sync::Arc;

use anyhow::{anyhow, Context};
use document::{Document, ErrorEnvelope, RunQueryRequest, RunQueryResponseEntry};
use portfolio_models::contact::{ContactMessageId, ContactRecord, StoredContactRecord};
use portfolio_store_contracts::{CollectionQuery, MessageStore, StoreError};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::http::HttpClient;

mod document;
pub mod http;

/// [`MessageStore`] backed by the REST interface of a hosted document
/// database.
#[derive(Debug, Clone)]
pub struct FirestoreMessageStore {
    config: FirestoreMessageStoreConfig,
    http: HttpClient,
}

#[derive(Debug, Clone)]
pub struct FirestoreMessageStoreConfig {
    database_endpoint: Arc<Url>,
    api_key: Arc<str>,
}

impl FirestoreMessageStoreConfig {
    /// `endpoint` is the API root, e.g. `https://firestore.googleapis.com/`.
    pub fn new(
        endpoint: &Url,
        project_id: &str,
        database: &str,
        api_key: &str,
    ) -> anyhow::Result<Self> {
        let database_endpoint = endpoint
            .join(&format!("v1/projects/{project_id}/databases/{database}/"))
            .context("Failed to build database endpoint")?;

        Ok(Self {
            database_endpoint: database_endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

impl FirestoreMessageStore {
    pub fn new(config: FirestoreMessageStoreConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            http: HttpClient::new()?,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.config
            .database_endpoint
            .join(path)
            .with_context(|| format!("Failed to build store url for {path:?}"))
    }
}

impl MessageStore for FirestoreMessageStore {
    #[tracing::instrument(skip(self, record), fields(timestamp = %record.timestamp))]
    async fn create(
        &self,
        collection: &str,
        record: &ContactRecord,
    ) -> Result<ContactMessageId, StoreError> {
        let response = self
            .http
            .post(self.url(&format!("documents/{collection}"))?)
            .query(&[("key", &*self.config.api_key)])
            .json(&Document::from_record(record))
            .send()
            .await
            .map_err(transport_error)?;

        let id = read_response::<Document>(response)
            .await?
            .id()
            .ok_or_else(|| anyhow!("Store returned a document without resource name"))?;

        debug!(%id, "created document");
        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    async fn query(
        &self,
        collection: &str,
        query: CollectionQuery,
    ) -> Result<Vec<StoredContactRecord>, StoreError> {
        // A relative reference starting with `documents:` would parse as a
        // url scheme.
        let response = self
            .http
            .post(self.url("./documents:runQuery")?)
            .query(&[("key", &*self.config.api_key)])
            .json(&RunQueryRequest::new(collection, &query))
            .send()
            .await
            .map_err(transport_error)?;

        let records = read_response::<Vec<RunQueryResponseEntry>>(response)
            .await?
            .into_iter()
            .filter_map(|entry| entry.document)
            .filter_map(|document| {
                serde_json::from_value::<Document>(document)
                    .context("Failed to decode document")
                    .and_then(Document::into_record)
                    .inspect_err(|err| warn!("Skipping stored document: {err:#}"))
                    .ok()
            })
            .collect::<Vec<_>>();

        debug!(count = records.len(), "queried documents");
        Ok(records)
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("Failed to deserialize store response")
            .map_err(Into::into);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_error(status, &body))
}

fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    envelope
        .as_ref()
        .and_then(|envelope| classify_status(&envelope.error.status))
        .or_else(|| classify_http_status(status))
        .unwrap_or_else(|| match envelope {
            Some(ErrorEnvelope { error }) => {
                anyhow!("{} ({status}): {}", error.status, error.message).into()
            }
            None => anyhow!("Store responded with {status}").into(),
        })
}

fn classify_status(status: &str) -> Option<StoreError> {
    Some(match status {
        "PERMISSION_DENIED" => StoreError::PermissionDenied,
        "UNAVAILABLE" => StoreError::Unavailable,
        "INVALID_ARGUMENT" => StoreError::InvalidArgument,
        "NOT_FOUND" => StoreError::NotFound,
        "UNAUTHENTICATED" => StoreError::Unauthenticated,
        "FAILED_PRECONDITION" => StoreError::FailedPrecondition,
        "RESOURCE_EXHAUSTED" => StoreError::QuotaExceeded,
        "CANCELLED" | "DEADLINE_EXCEEDED" => StoreError::Cancelled,
        _ => return None,
    })
}

fn classify_http_status(status: StatusCode) -> Option<StoreError> {
    Some(match status {
        StatusCode::BAD_REQUEST => StoreError::InvalidArgument,
        StatusCode::UNAUTHORIZED => StoreError::Unauthenticated,
        StatusCode::FORBIDDEN => StoreError::PermissionDenied,
        StatusCode::NOT_FOUND => StoreError::NotFound,
        StatusCode::TOO_MANY_REQUESTS => StoreError::QuotaExceeded,
        StatusCode::SERVICE_UNAVAILABLE => StoreError::Unavailable,
        _ => return None,
    })
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_connect() {
        StoreError::Unavailable
    } else if err.is_timeout() {
        StoreError::Cancelled
    } else {
        anyhow::Error::new(err)
            .context("Failed to send store request")
            .into()
    }
}

#[cfg(test)]
mod tests {
    use portfolio_utils::assert_matches;

    use super::*;

    fn envelope(code: u16, status: &str) -> String {
        format!(r#"{{"error": {{"code": {code}, "message": "details", "status": "{status}"}}}}"#)
    }

    #[test]
    fn classify_error_statuses() {
        let cases: [(&str, fn(&StoreError) -> bool); 9] = [
            ("PERMISSION_DENIED", |e| matches!(e, StoreError::PermissionDenied)),
            ("UNAVAILABLE", |e| matches!(e, StoreError::Unavailable)),
            ("INVALID_ARGUMENT", |e| matches!(e, StoreError::InvalidArgument)),
            ("NOT_FOUND", |e| matches!(e, StoreError::NotFound)),
            ("UNAUTHENTICATED", |e| matches!(e, StoreError::Unauthenticated)),
            ("FAILED_PRECONDITION", |e| matches!(e, StoreError::FailedPrecondition)),
            ("RESOURCE_EXHAUSTED", |e| matches!(e, StoreError::QuotaExceeded)),
            ("CANCELLED", |e| matches!(e, StoreError::Cancelled)),
            ("DEADLINE_EXCEEDED", |e| matches!(e, StoreError::Cancelled)),
        ];

        for (status, expected) in cases {
            // The envelope wins over the http status code.
            let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, &envelope(500, status));
            assert!(expected(&err), "{status}: {err:?}");
        }
    }

    #[test]
    fn classify_error_http_fallback() {
        assert_matches!(
            classify_error(StatusCode::FORBIDDEN, "<html>Forbidden</html>"),
            StoreError::PermissionDenied
        );
        assert_matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, ""),
            StoreError::QuotaExceeded
        );
        assert_matches!(
            classify_error(StatusCode::UNAUTHORIZED, &envelope(401, "")),
            StoreError::Unauthenticated
        );
    }

    #[test]
    fn classify_error_unknown() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, &envelope(500, "INTERNAL"));
        assert_eq!(
            err.to_string(),
            "Database submission failed: INTERNAL (500 Internal Server Error): details"
        );

        let err = classify_error(StatusCode::BAD_GATEWAY, "");
        assert_eq!(
            err.to_string(),
            "Database submission failed: Store responded with 502 Bad Gateway"
        );
    }

    #[test]
    fn config_endpoint() {
        let config = FirestoreMessageStoreConfig::new(
            &"https://firestore.googleapis.com".parse().unwrap(),
            "my-project",
            "(default)",
            "key",
        )
        .unwrap();

        assert_eq!(
            config.database_endpoint.as_str(),
            "https://firestore.googleapis.com/v1/projects/my-project/databases/(default)/"
        );
        assert_eq!(
            config
                .database_endpoint
                .join("./documents:runQuery")
                .unwrap()
                .as_str(),
            "https://firestore.googleapis.com/v1/projects/my-project/databases/(default)/documents:runQuery"
        );
    }
}
