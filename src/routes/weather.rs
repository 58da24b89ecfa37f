use crate::{
    app_state::AppState,
    weather_client::{Weather, WeatherError},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new().route("/weather", get(weather))
}

#[tracing::instrument(name = "Look up current weather", skip(app_state))]
async fn weather(
    State(app_state): State<AppState>,
    Query(parameters): Query<Parameters>,
) -> Result<Json<Weather>, WeatherLookupError> {
    let city = parameters
        .city
        .map(|city| city.trim().to_string())
        .filter(|city| !city.is_empty())
        .ok_or(WeatherLookupError::MissingCity)?;

    let weather = app_state.weather_client.current_weather(&city).await?;

    Ok(Json(weather))
}

#[derive(Debug, Deserialize)]
struct Parameters {
    city: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum WeatherLookupError {
    #[error("Please, choose 'city' parameter")]
    MissingCity,
    #[error("Failed to get weather data")]
    UpstreamError(#[from] WeatherError),
}

impl IntoResponse for WeatherLookupError {
    fn into_response(self) -> Response {
        tracing::error!("{:#?}", self);

        match self {
            Self::MissingCity => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            Self::UpstreamError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}
