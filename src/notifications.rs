use crate::domain::{SubscriberEmail, SubscriptionToken};
use async_trait::async_trait;
use axum::http::Uri;
use secrecy::ExposeSecret;

/// Delivers subscription links to a subscriber's inbox.
///
/// A failed unsubscribe link delivery is logged by the caller and does not undo
/// the confirmation it follows.
#[async_trait]
pub trait SubscriptionNotifier: Send + Sync {
    async fn send_confirmation_link(
        &self,
        recipient: &SubscriberEmail,
        link: &str,
    ) -> Result<(), anyhow::Error>;

    async fn send_unsubscribe_link(
        &self,
        recipient: &SubscriberEmail,
        link: &str,
    ) -> Result<(), anyhow::Error>;
}

/// Writes the links to the application log instead of sending mail.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl SubscriptionNotifier for LogNotifier {
    async fn send_confirmation_link(
        &self,
        recipient: &SubscriberEmail,
        link: &str,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(
            subscriber_email = %recipient,
            confirmation_link = link,
            "Please confirm your subscription by visiting the confirmation link"
        );
        Ok(())
    }

    async fn send_unsubscribe_link(
        &self,
        recipient: &SubscriberEmail,
        link: &str,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(
            subscriber_email = %recipient,
            unsubscribe_link = link,
            "Subscription confirmed, it can be cancelled with the unsubscribe link"
        );
        Ok(())
    }
}

pub fn confirmation_link(base_url: &Uri, token: &SubscriptionToken) -> String {
    link(base_url, "confirm", token)
}

pub fn unsubscribe_link(base_url: &Uri, token: &SubscriptionToken) -> String {
    link(base_url, "unsubscribe", token)
}

fn link(base_url: &Uri, action: &str, token: &SubscriptionToken) -> String {
    format!(
        "{}/{action}/{}",
        base_url.to_string().trim_end_matches('/'),
        token.expose_secret()
    )
}
