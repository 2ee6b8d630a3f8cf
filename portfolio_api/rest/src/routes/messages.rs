use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use portfolio_core_messages_contracts::MessagesFeatureService;
use tracing::warn;

use super::error;
use crate::{extractors::auth::ApiToken, models::contact::ApiContactMessage};

struct MessagesState<Messages> {
    service: Arc<Messages>,
    admin_token: Arc<str>,
}

impl<Messages> Clone for MessagesState<Messages> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            admin_token: Arc::clone(&self.admin_token),
        }
    }
}

pub fn router(service: Arc<impl MessagesFeatureService>, admin_token: Arc<str>) -> Router<()> {
    Router::new()
        .route("/contact/messages", routing::get(list_recent))
        .with_state(MessagesState {
            service,
            admin_token,
        })
}

async fn list_recent(
    state: State<MessagesState<impl MessagesFeatureService>>,
    token: ApiToken,
) -> Response {
    if token.0.is_empty() || *token.0 != *state.admin_token {
        return error(StatusCode::UNAUTHORIZED, "Invalid token");
    }

    match state.service.list_recent().await {
        Ok(messages) => Json(
            messages
                .into_iter()
                .map(ApiContactMessage::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => {
            warn!("Failed to load messages: {err}");
            error(StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}
