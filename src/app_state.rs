use crate::{
    notifications::SubscriptionNotifier, subscriptions::SubscriptionService,
    weather_client::WeatherClient,
};
use axum::http::Uri;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub subscriptions: SubscriptionService,
    pub weather_client: WeatherClient,
    pub notifier: Arc<dyn SubscriptionNotifier>,
    pub base_url: Uri,
}
