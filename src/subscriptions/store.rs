use crate::domain::{NewSubscription, SubscriberEmail, Subscription, SubscriptionToken};
use async_trait::async_trait;

/// Durable record of subscriptions keyed by email, with lookups by either token.
///
/// Implementations must make every mutation a single compare-and-swap against
/// the stored state, so concurrent callers never need in-process locking.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts a pending subscription, or resets an existing pending one to the
    /// given city, frequency and token. Fails without mutation when the email
    /// already has a confirmed subscription.
    async fn upsert_pending(
        &self,
        subscription: &NewSubscription,
        confirmation_token: &SubscriptionToken,
    ) -> Result<(), StoreError>;

    /// Returns the unconfirmed subscription holding `confirmation_token`.
    async fn find_pending_by_token(
        &self,
        confirmation_token: &SubscriptionToken,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Returns the subscription for `email` only if it is confirmed.
    async fn find_active_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Returns the subscription for `email` in whatever state it is in.
    async fn find_by_email(&self, email: &SubscriberEmail)
        -> Result<Option<Subscription>, StoreError>;

    /// Swaps the confirmation token for a freshly generated unsubscribe token,
    /// provided the row for `email` is still pending with exactly that token.
    async fn confirm(
        &self,
        email: &SubscriberEmail,
        confirmation_token: &SubscriptionToken,
    ) -> Result<SubscriptionToken, StoreError>;

    /// Removes the confirmed subscription holding `unsubscribe_token`.
    async fn delete_by_unsubscribe_token(
        &self,
        unsubscribe_token: &SubscriptionToken,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Email is already subscribed and confirmed")]
    DuplicateActiveSubscription,
    #[error("No pending subscription matches the email and confirmation token")]
    ConfirmationFailed,
    #[error("No active subscription matches the unsubscribe token")]
    NotFound,
    #[error("Generated token is already in use")]
    TokenCollision,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
