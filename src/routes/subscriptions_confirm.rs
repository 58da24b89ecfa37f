use super::{message, MessageBody};
use crate::{
    app_state::AppState,
    domain::SubscriptionToken,
    notifications::unsubscribe_link,
    subscriptions::{ConfirmationOutcome, SubscriptionError},
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
        .route("/confirm", get(missing_token))
        .route("/confirm/", get(missing_token))
        .route("/confirm/:token", get(confirm))
}

async fn missing_token() -> SubscriptionConfirmationError {
    SubscriptionConfirmationError::MissingToken
}

#[tracing::instrument(name = "Confirm a pending subscription", skip(app_state, token))]
async fn confirm(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageBody>, SubscriptionConfirmationError> {
    let confirmation_token = SubscriptionToken::parse(token)
        .map_err(SubscriptionConfirmationError::InvalidTokenFormat)?;

    match app_state.subscriptions.confirm(&confirmation_token).await? {
        ConfirmationOutcome::Confirmed {
            email,
            unsubscribe_token,
        } => {
            // The row is already active; a delivery failure is only logged.
            if let Err(e) = app_state
                .notifier
                .send_unsubscribe_link(
                    &email,
                    &unsubscribe_link(&app_state.base_url, &unsubscribe_token),
                )
                .await
            {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    subscriber_email = %email,
                    "Failed to send the unsubscribe link"
                );
            }

            Ok(message("Subscription confirmed successfully"))
        }
        ConfirmationOutcome::AlreadyConfirmed => Ok(message("Subscription is already confirmed")),
    }
}

#[derive(Debug, thiserror::Error)]
enum SubscriptionConfirmationError {
    #[error("Invalid token: token is missing in path")]
    MissingToken,
    #[error("{0}")]
    InvalidTokenFormat(String),
    #[error("Token not found, invalid, or subscription already confirmed")]
    UnknownToken,
    #[error("Failed to confirm subscription. Token may be invalid or already used.")]
    Conflict,
    #[error("Internal server error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl From<SubscriptionError> for SubscriptionConfirmationError {
    fn from(error: SubscriptionError) -> Self {
        match error {
            SubscriptionError::NotFound(_) => Self::UnknownToken,
            SubscriptionError::Conflict(_) => Self::Conflict,
            SubscriptionError::Validation(e) => Self::InvalidTokenFormat(e),
            SubscriptionError::Unexpected(e) => Self::UnexpectedError(e),
        }
    }
}

impl IntoResponse for SubscriptionConfirmationError {
    fn into_response(self) -> Response {
        tracing::error!("{:#?}", self);

        let status = match self {
            Self::MissingToken | Self::InvalidTokenFormat(_) | Self::Conflict => {
                StatusCode::BAD_REQUEST
            }
            Self::UnknownToken => StatusCode::NOT_FOUND,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
