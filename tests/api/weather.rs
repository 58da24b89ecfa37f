use crate::helpers::TestApp;
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, method, path, query_param},
    Mock, ResponseTemplate,
};

fn provider_body(location_name: &str) -> Value {
    json!({
        "location": { "name": location_name },
        "current": {
            "temp_c": 15.5,
            "humidity": 72,
            "condition": { "text": "Light rain" }
        }
    })
}

#[tokio::test]
async fn weather_returns_current_conditions_for_a_city() {
    // given
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/current.json"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_body("London")))
        .expect(1)
        .mount(&app.weather_server)
        .await;

    // when
    let response = app.get_weather("London").await;

    // then
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "city": "London",
            "temperature": 15.5,
            "humidity": 72.0,
            "description": "Light rain"
        })
    );
}

#[tokio::test]
async fn weather_omits_the_city_when_the_provider_does_not_name_it() {
    // given
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_body("")))
        .mount(&app.weather_server)
        .await;

    // when
    let response = app.get_weather("London").await;

    // then
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("city").is_none(), "unexpected city in {body}");
}

#[tokio::test]
async fn weather_returns_a_400_when_city_is_missing() {
    // given
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.weather_server)
        .await;

    for response in [app.get("/weather").await, app.get_weather("").await] {
        // then
        assert_eq!(response.status(), 400);
        let body = response.text().await.unwrap();
        assert!(body.contains("city"), "'{body}' did not mention the city parameter");
    }
}

#[tokio::test]
async fn weather_returns_a_500_when_the_provider_fails() {
    // given
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(401).set_body_string("API key is invalid."))
        .expect(1)
        .mount(&app.weather_server)
        .await;

    // when
    let response = app.get_weather("London").await;

    // then
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn weather_returns_a_500_when_the_provider_response_is_unparsable() {
    // given
    let app = TestApp::spawn().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
        .expect(1)
        .mount(&app.weather_server)
        .await;

    // when
    let response = app.get_weather("London").await;

    // then
    assert_eq!(response.status(), 500);
}
