//! In-memory fake of the REST document API, good enough for the contact
//! form and the messages view.
//!
//! Failures are injected through the submitted `name` field:
//! `fail-permission-denied` answers with a `PERMISSION_DENIED` error (any
//! status works, lowercase with dashes) and `slow-SECS` delays the response
//! by `SECS` seconds before storing the document.

use std::{collections::HashMap, net::IpAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

const DATABASE_ROUTE: &str = "/v1/projects/:project/databases/:database/*path";

pub async fn start_server(host: IpAddr, port: u16, api_key: String) -> anyhow::Result<()> {
    info!("Starting document store testing server on {host}:{port}");
    info!("Store endpoint: http://{host}:{port}/");
    info!("API key: {api_key:?}");
    info!(
        "Submit a name like \"fail-permission-denied\" to get an error response or \
         \"slow-SECS\" to delay the response by SECS seconds"
    );

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    serve(listener, api_key).await
}

/// Serves the fake store on an already bound listener.
pub async fn serve(listener: TcpListener, api_key: String) -> anyhow::Result<()> {
    axum::serve(listener, router(api_key))
        .await
        .context("Failed to start HTTP server")
}

pub fn router(api_key: String) -> Router {
    Router::new()
        .route(DATABASE_ROUTE, routing::post(database))
        .with_state(Arc::new(StateInner {
            api_key,
            collections: Default::default(),
        }))
}

struct StateInner {
    api_key: String,
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

type AppState = State<Arc<StateInner>>;

#[derive(Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

async fn database(
    state: AppState,
    Path((project, database, path)): Path<(String, String, String)>,
    Query(KeyQuery { key }): Query<KeyQuery>,
    Json(body): Json<Value>,
) -> Response {
    if key.as_deref() != Some(state.api_key.as_str()) {
        return error("UNAUTHENTICATED", "API key not valid. Please pass a valid API key.");
    }

    let path = path.trim_start_matches('/');
    if path == "documents:runQuery" {
        return run_query(&state, body).await;
    }

    match path.strip_prefix("documents/") {
        Some(collection) if !collection.is_empty() && !collection.contains('/') => {
            let prefix = format!("projects/{project}/databases/{database}/documents");
            create(&state, &prefix, collection, body).await
        }
        _ => error("NOT_FOUND", &format!("Unknown resource {path:?}")),
    }
}

async fn create(state: &StateInner, prefix: &str, collection: &str, mut body: Value) -> Response {
    let submitted_name = body
        .pointer("/fields/name/stringValue")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if let Some(status) = submitted_name.strip_prefix("fail-") {
        let status = status.to_uppercase().replace('-', "_");
        return error(&status, "Injected failure");
    }

    if let Some(secs) = submitted_name
        .strip_prefix("slow-")
        .and_then(|secs| secs.parse().ok())
    {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    let Some(document) = body.as_object_mut().filter(|doc| doc.contains_key("fields")) else {
        return error("INVALID_ARGUMENT", "Document must contain fields");
    };

    let id = Uuid::new_v4().simple().to_string();
    let now = timestamp(Utc::now());
    document.insert("name".into(), format!("{prefix}/{collection}/{id}").into());
    document.insert("createTime".into(), now.clone().into());
    document.insert("updateTime".into(), now.into());

    state
        .collections
        .write()
        .await
        .entry(collection.into())
        .or_default()
        .push(body.clone());

    Json(body).into_response()
}

async fn run_query(state: &StateInner, body: Value) -> Response {
    let query = &body["structuredQuery"];
    let Some(collection) = query["from"][0]["collectionId"].as_str() else {
        return error("INVALID_ARGUMENT", "Query must select a collection");
    };
    let order_by = query["orderBy"][0]["field"]["fieldPath"].as_str();
    let descending = query["orderBy"][0]["direction"].as_str() == Some("DESCENDING");
    let limit = query["limit"].as_u64().unwrap_or(u64::MAX) as usize;

    let mut documents = state
        .collections
        .read()
        .await
        .get(collection)
        .cloned()
        .unwrap_or_default();

    if let Some(field) = order_by {
        documents.sort_by_cached_key(|doc| sort_key(doc, field));
        if descending {
            documents.reverse();
        }
    }

    let read_time = timestamp(Utc::now());
    let mut entries = documents
        .into_iter()
        .take(limit)
        .map(|document| json!({"document": document, "readTime": read_time}))
        .collect::<Vec<_>>();
    if entries.is_empty() {
        entries.push(json!({"readTime": read_time}));
    }

    Json(entries).into_response()
}

/// Timestamps compare chronologically, everything else by its string form.
fn sort_key(document: &Value, field: &str) -> (Option<DateTime<Utc>>, String) {
    let value = &document["fields"][field];
    let timestamp = value["timestampValue"]
        .as_str()
        .and_then(|ts| ts.parse().ok());
    let string = value["stringValue"].as_str().unwrap_or_default().to_owned();
    (timestamp, string)
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn error(status: &str, message: &str) -> Response {
    let code = match status {
        "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "OUT_OF_RANGE" => StatusCode::BAD_REQUEST,
        "UNAUTHENTICATED" => StatusCode::UNAUTHORIZED,
        "PERMISSION_DENIED" => StatusCode::FORBIDDEN,
        "NOT_FOUND" => StatusCode::NOT_FOUND,
        "ALREADY_EXISTS" | "ABORTED" => StatusCode::CONFLICT,
        "RESOURCE_EXHAUSTED" => StatusCode::TOO_MANY_REQUESTS,
        "CANCELLED" => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
        "UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
        "DEADLINE_EXCEEDED" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        code,
        Json(json!({
            "error": {
                "code": code.as_u16(),
                "message": message,
                "status": status,
            }
        })),
    )
        .into_response()
}
