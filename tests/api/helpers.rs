use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use serde_json::Value;
use sqlx::SqlitePool;
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use uuid::Uuid;
use weather_subscriptions::{
    configuration::get_configuration,
    domain::{SubscriberEmail, Subscription},
    notifications::SubscriptionNotifier,
    startup::{get_connection_pool, Application},
    subscriptions::{SqliteSubscriptionStore, SubscriptionService, SubscriptionStore},
    telemetry::{get_subscriber, init_subscriber},
};
use wiremock::MockServer;

static TRACING: Lazy<()> = Lazy::new(|| {
    let name = "test";
    let default_env_filter = "info";
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(name.into(), default_env_filter.into(), std::io::stdout);
        init_subscriber(subscriber).expect("Failed to initialize tracing");
    } else {
        let subscriber = get_subscriber(name.into(), default_env_filter.into(), std::io::sink);
        init_subscriber(subscriber).expect("Failed to initialize tracing");
    }
});

static FAILED_TO_EXECUTE_REQUEST: &str = "Failed to execute request";

pub struct TestApp {
    pub address: SocketAddr,
    pub db_pool: SqlitePool,
    pub weather_server: MockServer,
    pub notifier: Arc<RecordingNotifier>,
    db_file: PathBuf,
    client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Lazy::force(&TRACING);

        let db_file = std::env::temp_dir().join(format!("weather-subscriptions-{}.db", Uuid::new_v4()));
        let weather_server = MockServer::start().await;

        let mut config = get_configuration().expect("Failed to read configuration");
        config.database.filename = db_file.to_string_lossy().into_owned();
        config.database.create_if_missing = true;
        config.application.port = 0;
        config.weather_client.base_url = weather_server.uri();

        let db_pool = get_connection_pool(&config.database);
        let notifier = Arc::new(RecordingNotifier::default());

        let app = Application::build_with_notifier(config, notifier.clone())
            .await
            .expect("Failed to build application");
        let address = app.local_addr();

        tokio::spawn(app.run_until_stopped());

        Self {
            address,
            db_pool,
            weather_server,
            notifier,
            db_file,
            client: Client::new(),
        }
    }

    pub async fn get_health_check(&self) -> Response {
        self.get("/health_check").await
    }

    pub async fn get_weather(&self, city: &str) -> Response {
        self.client
            .get(self.url("/weather"))
            .query(&[("city", city)])
            .send()
            .await
            .expect(FAILED_TO_EXECUTE_REQUEST)
    }

    pub async fn post_subscribe(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/subscribe"))
            .json(body)
            .send()
            .await
            .expect(FAILED_TO_EXECUTE_REQUEST)
    }

    pub async fn post_subscribe_raw(&self, content_type: &str, body: &'static str) -> Response {
        self.client
            .post(self.url("/subscribe"))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect(FAILED_TO_EXECUTE_REQUEST)
    }

    pub async fn confirm_subscription(&self, token: &str) -> Response {
        self.get(&format!("/confirm/{token}")).await
    }

    pub async fn unsubscribe(&self, token: &str) -> Response {
        self.get(&format!("/unsubscribe/{token}")).await
    }

    pub async fn get(&self, endpoint: &str) -> Response {
        self.client
            .get(self.url(endpoint))
            .send()
            .await
            .expect(FAILED_TO_EXECUTE_REQUEST)
    }

    /// Subscribes `email` and returns the token from the confirmation link.
    pub async fn create_pending_subscription(&self, email: &str, city: &str, frequency: &str) -> String {
        let body = serde_json::json!({ "email": email, "city": city, "frequency": frequency });
        self.post_subscribe(&body)
            .await
            .error_for_status()
            .expect("Failed to create pending subscription");

        self.notifier
            .last_token(LinkKind::Confirmation)
            .expect("No confirmation link was sent")
    }

    /// Subscribes and confirms `email`, returning the confirmation and unsubscribe tokens.
    pub async fn create_active_subscription(&self, email: &str) -> (String, String) {
        let confirmation_token = self.create_pending_subscription(email, "Kyiv", "daily").await;
        self.confirm_subscription(&confirmation_token)
            .await
            .error_for_status()
            .expect("Failed to confirm subscription");

        let unsubscribe_token = self
            .notifier
            .last_token(LinkKind::Unsubscribe)
            .expect("No unsubscribe link was sent");

        (confirmation_token, unsubscribe_token)
    }

    pub async fn subscription(&self, email: &str) -> Option<Subscription> {
        let email = SubscriberEmail::parse(email.into()).expect("Invalid test email");
        self.store()
            .find_by_email(&email)
            .await
            .expect("Failed to fetch subscription")
    }

    pub async fn subscription_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count subscriptions")
    }

    pub fn store(&self) -> SqliteSubscriptionStore {
        SqliteSubscriptionStore::new(self.db_pool.clone())
    }

    pub fn service(&self) -> SubscriptionService {
        SubscriptionService::new(Arc::new(self.store()))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("http://{}{endpoint}", self.address)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_file.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinkKind {
    Confirmation,
    Unsubscribe,
}

#[derive(Debug)]
pub struct SentLink {
    pub kind: LinkKind,
    pub recipient: String,
    pub link: String,
}

impl SentLink {
    pub fn token(&self) -> String {
        self.link
            .rsplit('/')
            .next()
            .expect("Link has no path segments")
            .to_string()
    }
}

/// Keeps every link the application hands out so tests can follow them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentLink>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// Makes every following delivery fail without recording the link.
    pub fn fail_deliveries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self, kind: LinkKind) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|link| link.kind == kind)
            .map(|link| link.link.clone())
            .collect()
    }

    pub fn last_token(&self, kind: LinkKind) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|link| link.kind == kind)
            .map(SentLink::token)
    }

    pub fn last_recipient(&self, kind: LinkKind) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|link| link.kind == kind)
            .map(|link| link.recipient.clone())
    }

    fn record(
        &self,
        kind: LinkKind,
        recipient: &SubscriberEmail,
        link: &str,
    ) -> Result<(), anyhow::Error> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("Mail server is unavailable");
        }

        self.sent.lock().unwrap().push(SentLink {
            kind,
            recipient: recipient.to_string(),
            link: link.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl SubscriptionNotifier for RecordingNotifier {
    async fn send_confirmation_link(
        &self,
        recipient: &SubscriberEmail,
        link: &str,
    ) -> Result<(), anyhow::Error> {
        self.record(LinkKind::Confirmation, recipient, link)
    }

    async fn send_unsubscribe_link(
        &self,
        recipient: &SubscriberEmail,
        link: &str,
    ) -> Result<(), anyhow::Error> {
        self.record(LinkKind::Unsubscribe, recipient, link)
    }
}
