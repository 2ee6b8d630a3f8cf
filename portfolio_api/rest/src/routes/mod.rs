use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ApiError;

pub mod contact;
pub mod messages;

fn error(code: StatusCode, detail: impl Into<String>) -> Response {
    (
        code,
        Json(ApiError {
            detail: detail.into(),
        }),
    )
        .into_response()
}
