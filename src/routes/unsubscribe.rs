use super::{message, MessageBody};
use crate::{
    app_state::AppState,
    domain::SubscriptionToken,
    subscriptions::SubscriptionError,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/unsubscribe", get(missing_token))
        .route("/unsubscribe/", get(missing_token))
        .route("/unsubscribe/:token", get(unsubscribe))
}

async fn missing_token() -> UnsubscribeError {
    UnsubscribeError::MissingToken
}

#[tracing::instrument(name = "Unsubscribe an active subscription", skip(app_state, token))]
async fn unsubscribe(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageBody>, UnsubscribeError> {
    let unsubscribe_token = SubscriptionToken::parse(token).map_err(|e| {
        tracing::info!(error = %e, "Unsubscribe token is not well-formed");
        UnsubscribeError::NotFound
    })?;

    app_state
        .subscriptions
        .unsubscribe(&unsubscribe_token)
        .await?;

    Ok(message("Unsubscribed successfully"))
}

#[derive(Debug, thiserror::Error)]
enum UnsubscribeError {
    #[error("Invalid unsubscribe token: token is missing in path")]
    MissingToken,
    #[error("Failed to unsubscribe. Token may be invalid or subscription not found.")]
    NotFound,
    #[error("Internal server error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<SubscriptionError> for UnsubscribeError {
    fn from(error: SubscriptionError) -> Self {
        match error {
            SubscriptionError::NotFound(_)
            | SubscriptionError::Conflict(_)
            | SubscriptionError::Validation(_) => Self::NotFound,
            SubscriptionError::Unexpected(e) => Self::UnexpectedError(e),
        }
    }
}

impl IntoResponse for UnsubscribeError {
    fn into_response(self) -> Response {
        tracing::error!("{:#?}", self);

        let status = match self {
            Self::MissingToken => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
