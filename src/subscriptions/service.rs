use super::{StoreError, SubscriptionStore};
use crate::domain::{NewSubscription, SubscriberEmail, SubscriptionToken};
use std::sync::Arc;

/// Drives a subscription through pending, active and removed.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
}

/// A freshly stored pending subscription, ready to be sent its confirmation link.
#[derive(Debug)]
pub struct PendingSubscription {
    pub email: SubscriberEmail,
    pub confirmation_token: SubscriptionToken,
}

#[derive(Debug)]
pub enum ConfirmationOutcome {
    Confirmed {
        email: SubscriberEmail,
        unsubscribe_token: SubscriptionToken,
    },
    AlreadyConfirmed,
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "Request a new subscription", skip(self))]
    pub async fn request_subscription(
        &self,
        email: String,
        city: String,
        frequency: String,
    ) -> Result<PendingSubscription, SubscriptionError> {
        let subscription =
            NewSubscription::parse(email, city, frequency).map_err(SubscriptionError::Validation)?;
        let confirmation_token = SubscriptionToken::generate();

        match self
            .store
            .upsert_pending(&subscription, &confirmation_token)
            .await
        {
            Ok(()) => Ok(PendingSubscription {
                email: subscription.email,
                confirmation_token,
            }),
            Err(StoreError::DuplicateActiveSubscription) => Err(SubscriptionError::Conflict(
                StoreError::DuplicateActiveSubscription.to_string(),
            )),
            Err(e) => Err(unexpected(e)),
        }
    }

    #[tracing::instrument(name = "Confirm a pending subscription", skip_all)]
    pub async fn confirm(
        &self,
        confirmation_token: &SubscriptionToken,
    ) -> Result<ConfirmationOutcome, SubscriptionError> {
        let pending = self
            .store
            .find_pending_by_token(confirmation_token)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| {
                SubscriptionError::NotFound(
                    "Token not found, invalid, or subscription already confirmed".into(),
                )
            })?;

        if self
            .store
            .find_active_by_email(&pending.email)
            .await
            .map_err(unexpected)?
            .is_some()
        {
            tracing::info!(subscriber_email = %pending.email, "Subscription is already confirmed");
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        match self.store.confirm(&pending.email, confirmation_token).await {
            Ok(unsubscribe_token) => Ok(ConfirmationOutcome::Confirmed {
                email: pending.email,
                unsubscribe_token,
            }),
            Err(e @ StoreError::ConfirmationFailed) => {
                Err(SubscriptionError::Conflict(e.to_string()))
            }
            Err(e) => Err(unexpected(e)),
        }
    }

    #[tracing::instrument(name = "Remove an active subscription", skip_all)]
    pub async fn unsubscribe(
        &self,
        unsubscribe_token: &SubscriptionToken,
    ) -> Result<(), SubscriptionError> {
        match self
            .store
            .delete_by_unsubscribe_token(unsubscribe_token)
            .await
        {
            Ok(()) => Ok(()),
            Err(e @ StoreError::NotFound) => Err(SubscriptionError::NotFound(e.to_string())),
            Err(e) => Err(unexpected(e)),
        }
    }
}

fn unexpected(error: StoreError) -> SubscriptionError {
    match error {
        StoreError::Unexpected(e) => SubscriptionError::Unexpected(e),
        other => SubscriptionError::Unexpected(anyhow::Error::new(other)),
    }
}
