use super::{StoreError, SubscriptionStore};
use crate::domain::{NewSubscription, SubscriberEmail, Subscription, SubscriptionToken};
use anyhow::Context;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use time::OffsetDateTime;

const SUBSCRIPTION_COLUMNS: &str = r#"
    email, city, frequency, confirmed, confirmation_token, unsubscribe_token, created_at
"#;

/// [`SubscriptionStore`] backed by the `subscriptions` table.
#[derive(Clone)]
pub struct SqliteSubscriptionStore {
    db_pool: SqlitePool,
}

impl SqliteSubscriptionStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionStore for SqliteSubscriptionStore {
    #[tracing::instrument(
        name = "Store pending subscription",
        skip(self, subscription, confirmation_token),
        fields(subscriber_email = %subscription.email, city = %subscription.city)
    )]
    async fn upsert_pending(
        &self,
        subscription: &NewSubscription,
        confirmation_token: &SubscriptionToken,
    ) -> Result<(), StoreError> {
        // The WHERE clause keeps a confirmed row untouched, which shows up as zero rows affected.
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (
                email, city, frequency, confirmed, confirmation_token, unsubscribe_token, created_at
            )
            VALUES (?1, ?2, ?3, 0, ?4, NULL, ?5)
            ON CONFLICT (email) DO UPDATE SET
                city = excluded.city,
                frequency = excluded.frequency,
                confirmed = 0,
                confirmation_token = excluded.confirmation_token,
                unsubscribe_token = NULL,
                created_at = excluded.created_at
            WHERE subscriptions.confirmed = 0
            "#,
        )
        .bind(subscription.email.as_ref())
        .bind(subscription.city.as_ref())
        .bind(subscription.frequency.as_ref())
        .bind(confirmation_token.expose_secret().as_str())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.db_pool)
        .await
        .map_err(|e| classify(e, "Failed to store pending subscription"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateActiveSubscription);
        }

        Ok(())
    }

    #[tracing::instrument(name = "Find pending subscription by token", skip_all)]
    async fn find_pending_by_token(
        &self,
        confirmation_token: &SubscriptionToken,
    ) -> Result<Option<Subscription>, StoreError> {
        let query = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE confirmation_token = ?1 AND confirmed = 0"
        );

        let subscription = sqlx::query_as::<_, Subscription>(&query)
            .bind(confirmation_token.expose_secret().as_str())
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch pending subscription by token")?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Find active subscription by email", skip(self))]
    async fn find_active_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StoreError> {
        let query = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
             WHERE email = ?1 AND confirmed = 1"
        );

        let subscription = sqlx::query_as::<_, Subscription>(&query)
            .bind(email.as_ref())
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch active subscription by email")?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Find subscription by email", skip(self))]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscription>, StoreError> {
        let query = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE email = ?1");

        let subscription = sqlx::query_as::<_, Subscription>(&query)
            .bind(email.as_ref())
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch subscription by email")?;

        Ok(subscription)
    }

    #[tracing::instrument(
        name = "Mark subscription as confirmed",
        skip(self, confirmation_token),
        fields(subscriber_email = %email)
    )]
    async fn confirm(
        &self,
        email: &SubscriberEmail,
        confirmation_token: &SubscriptionToken,
    ) -> Result<SubscriptionToken, StoreError> {
        let unsubscribe_token = SubscriptionToken::generate();

        let mut transaction = self
            .db_pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET confirmed = 1, confirmation_token = NULL, unsubscribe_token = ?1
            WHERE email = ?2 AND confirmation_token = ?3 AND confirmed = 0
            "#,
        )
        .bind(unsubscribe_token.expose_secret().as_str())
        .bind(email.as_ref())
        .bind(confirmation_token.expose_secret().as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|e| classify(e, "Failed to confirm subscription"))?;

        if result.rows_affected() != 1 {
            return Err(StoreError::ConfirmationFailed);
        }

        transaction
            .commit()
            .await
            .context("Failed to commit transaction")?;

        Ok(unsubscribe_token)
    }

    #[tracing::instrument(name = "Delete subscription by unsubscribe token", skip_all)]
    async fn delete_by_unsubscribe_token(
        &self,
        unsubscribe_token: &SubscriptionToken,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM subscriptions
            WHERE unsubscribe_token = ?1 AND confirmed = 1
            "#,
        )
        .bind(unsubscribe_token.expose_secret().as_str())
        .execute(&self.db_pool)
        .await
        .context("Failed to delete subscription")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

fn classify(error: sqlx::Error, context: &'static str) -> StoreError {
    match &error {
        sqlx::Error::Database(e) if e.is_unique_violation() => StoreError::TokenCollision,
        _ => StoreError::Unexpected(anyhow::Error::new(error).context(context)),
    }
}
