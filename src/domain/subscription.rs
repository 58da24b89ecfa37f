use super::{CityName, Frequency, SubscriberEmail, SubscriptionToken};
use sqlx::FromRow;
use time::OffsetDateTime;

/// A stored subscription row.
///
/// A pending row carries only a confirmation token, an active row only an
/// unsubscribe token.
#[derive(Debug, FromRow)]
pub struct Subscription {
    pub email: SubscriberEmail,
    pub city: CityName,
    pub frequency: Frequency,
    pub confirmed: bool,
    pub confirmation_token: Option<SubscriptionToken>,
    pub unsubscribe_token: Option<SubscriptionToken>,
    pub created_at: OffsetDateTime,
}

impl Subscription {
    pub fn is_pending(&self) -> bool {
        !self.confirmed && self.confirmation_token.is_some() && self.unsubscribe_token.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.confirmed && self.confirmation_token.is_none() && self.unsubscribe_token.is_some()
    }
}
