use super::{message, MessageBody};
use crate::{
    app_state::AppState,
    notifications::confirmation_link,
    subscriptions::{PendingSubscription, SubscriptionError},
};
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new().route("/subscribe", post(subscribe))
}

#[tracing::instrument(
    name = "Adding a new subscription",
    skip(app_state, headers, body),
    fields(subscriber_email = tracing::field::Empty, city = tracing::field::Empty)
)]
async fn subscribe(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageBody>, SubscribeError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/json") {
        tracing::warn!(content_type, "Unexpected content type, decoding the body as JSON");
    }

    let request: SubscribeRequest = serde_json::from_slice(&body)
        .map_err(|e| SubscribeError::ValidationError(e.to_string()))?;

    tracing::Span::current()
        .record("subscriber_email", request.email.as_str())
        .record("city", request.city.as_str());

    let PendingSubscription {
        email,
        confirmation_token,
    } = app_state
        .subscriptions
        .request_subscription(request.email, request.city, request.frequency)
        .await?;

    app_state
        .notifier
        .send_confirmation_link(
            &email,
            &confirmation_link(&app_state.base_url, &confirmation_token),
        )
        .await
        .context("Failed to send the confirmation link")?;

    Ok(message("Subscription successful. Confirmation email sent."))
}

#[derive(Deserialize)]
struct SubscribeRequest {
    email: String,
    city: String,
    frequency: String,
}

#[derive(Debug, thiserror::Error)]
enum SubscribeError {
    #[error("Invalid input: {0}")]
    ValidationError(String),
    #[error("Email already subscribed and confirmed")]
    Conflict,
    #[error("Failed to process subscription")]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<SubscriptionError> for SubscribeError {
    fn from(error: SubscriptionError) -> Self {
        match error {
            SubscriptionError::Validation(e) => Self::ValidationError(e),
            SubscriptionError::Conflict(_) => Self::Conflict,
            SubscriptionError::NotFound(e) => Self::UnexpectedError(anyhow::anyhow!(e)),
            SubscriptionError::Unexpected(e) => Self::UnexpectedError(e),
        }
    }
}

impl IntoResponse for SubscribeError {
    fn into_response(self) -> Response {
        tracing::error!("{:#?}", self);

        let status = match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
