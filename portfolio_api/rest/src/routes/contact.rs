use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use portfolio_core_contact_contracts::{ContactFeatureService, ContactSubmitError};
use portfolio_models::contact::ContactForm;

use crate::models::contact::{
    ApiContactForm, ApiContactSubmitted, ApiFallback, ApiValidationError,
};

pub fn router(service: Arc<impl ContactFeatureService>) -> Router<()> {
    Router::new()
        .route("/contact", routing::post(submit))
        .with_state(service)
}

async fn submit(
    service: State<Arc<impl ContactFeatureService>>,
    Json(form): Json<ApiContactForm>,
) -> Response {
    let mut form = ContactForm::from(form);

    match service.submit(&mut form).await {
        Ok(id) => Json(ApiContactSubmitted { id }).into_response(),
        Err(ContactSubmitError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiValidationError::from(&errors)),
        )
            .into_response(),
        Err(err @ ContactSubmitError::InFlight { .. }) => fallback(StatusCode::CONFLICT, &err),
        Err(err @ ContactSubmitError::Persist { .. }) => fallback(StatusCode::BAD_GATEWAY, &err),
        Err(err @ ContactSubmitError::Timeout { .. }) => {
            fallback(StatusCode::GATEWAY_TIMEOUT, &err)
        }
    }
}

fn fallback(code: StatusCode, err: &ContactSubmitError) -> Response {
    let fallback = err.fallback().map(|draft| draft.mailto_link()).unwrap_or_default();
    (
        code,
        Json(ApiFallback {
            detail: err.to_string(),
            fallback,
        }),
    )
        .into_response()
}
