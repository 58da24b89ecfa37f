use crate::{
    app_state::AppState,
    configuration::{DatabaseSettings, Settings},
    notifications::{LogNotifier, SubscriptionNotifier},
    request_id::{RequestUuid, X_REQUEST_ID},
    routes::{health_check, subscriptions, subscriptions_confirm, unsubscribe, weather},
    subscriptions::{SqliteSubscriptionStore, SubscriptionService},
    telemetry::request_span,
};
use anyhow::Context;
use axum::{http::Uri, serve::Serve, Router};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub struct Application {
    local_addr: SocketAddr,
    server: Serve<Router, Router>,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        Self::build_with_notifier(config, Arc::new(LogNotifier)).await
    }

    pub async fn build_with_notifier(
        config: Settings,
        notifier: Arc<dyn SubscriptionNotifier>,
    ) -> Result<Self, anyhow::Error> {
        let db_pool = get_connection_pool(&config.database);

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to migrate the database")?;

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read local address")?;

        let app_state = AppState {
            subscriptions: SubscriptionService::new(Arc::new(SqliteSubscriptionStore::new(
                db_pool,
            ))),
            weather_client: config
                .weather_client
                .client()
                .context("Failed to build the weather client")?,
            notifier,
            base_url: config
                .application
                .base_url
                .parse::<Uri>()
                .context("Failed to parse the application base url")?,
        };

        let server = axum::serve(listener, router(app_state));

        Ok(Self { local_addr, server })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!("Listening on {}", self.local_addr);
        self.server.await
    }
}

pub fn get_connection_pool(config: &DatabaseSettings) -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy_with(config.connect_options())
}

fn router(app_state: AppState) -> Router {
    Router::new()
        .merge(health_check::router())
        .merge(weather::router())
        .merge(subscriptions::router())
        .merge(subscriptions_confirm::router())
        .merge(unsubscribe::router())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, RequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
        .with_state(app_state)
}
