pub mod app_state;
pub mod configuration;
pub mod domain;
pub mod notifications;
pub mod request_id;
pub mod routes;
pub mod startup;
pub mod subscriptions;
pub mod telemetry;
pub mod weather_client;
