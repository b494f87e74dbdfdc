//! Integration tests for the OpenWeatherMap client against a mock server.

use std::time::Duration;

use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use festive_weather::{Coordinates, LocationQuery, WeatherError, WeatherProvider};

async fn provider_for(server: &MockServer) -> WeatherProvider {
    let api_url = Url::parse(&format!("{}/data/2.5/weather", server.uri())).unwrap();
    WeatherProvider::new(api_url, "test-key".to_string(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetches_and_converts_city_weather() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Seattle"))
        .and(query_param("APPID", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": { "temp": 294.15, "humidity": 60 },
                "name": "Seattle"
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reading = provider_for(&server)
        .await
        .current(&LocationQuery::City("Seattle".to_string()))
        .await
        .unwrap();

    // 294.15 K is 69.8 F
    assert_eq!(reading.temperature, 70);
}

#[tokio::test]
async fn fetches_coordinate_weather() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "47.6062"))
        .and(query_param("lon", "-122.3321"))
        .and(query_param("APPID", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "main": { "temp": 273.15 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reading = provider_for(&server)
        .await
        .current(&LocationQuery::Coordinates(Coordinates {
            latitude: 47.6062,
            longitude: -122.3321,
        }))
        .await
        .unwrap();

    assert_eq!(reading.temperature, 32);
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .await
        .current(&LocationQuery::City("Seattle".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn missing_temperature_field_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Seattle" })),
        )
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .await
        .current(&LocationQuery::City("Seattle".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn server_error_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .await
        .current(&LocationQuery::City("Seattle".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Api { status: 500 }));
}
