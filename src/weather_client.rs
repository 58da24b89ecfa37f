use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Current conditions for a location.
#[derive(Debug, PartialEq, Serialize)]
pub struct Weather {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    pub temperature: f64,
    pub humidity: f64,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Failed to reach the weather provider")]
    Transport(#[source] reqwest::Error),
    #[error("Weather provider responded with {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },
    #[error("Weather provider returned an unparsable response")]
    InvalidResponse(#[source] reqwest::Error),
}

#[derive(Clone)]
pub struct WeatherClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl WeatherClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    #[tracing::instrument(name = "Fetch current weather", skip(self))]
    pub async fn current_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        let url = format!("{}/current.json", self.base_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.expose_secret().as_str()),
                ("q", city),
                ("aqi", "no"),
            ])
            .send()
            .await
            .map_err(WeatherError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::UpstreamStatus { status, body });
        }

        let current: CurrentWeatherResponse = response
            .json()
            .await
            .map_err(WeatherError::InvalidResponse)?;

        Ok(current.into())
    }
}

#[derive(Deserialize)]
struct CurrentWeatherResponse {
    location: Location,
    current: Current,
}

#[derive(Deserialize)]
struct Location {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct Current {
    temp_c: f64,
    humidity: f64,
    condition: Condition,
}

#[derive(Deserialize)]
struct Condition {
    text: String,
}

impl From<CurrentWeatherResponse> for Weather {
    fn from(response: CurrentWeatherResponse) -> Self {
        Self {
            city: response.location.name,
            temperature: response.current.temp_c,
            humidity: response.current.humidity,
            description: response.current.condition.text,
        }
    }
}
