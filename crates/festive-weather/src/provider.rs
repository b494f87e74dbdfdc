//! OpenWeatherMap client.

use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::types::{kelvin_to_fahrenheit, LocationQuery, WeatherError, WeatherReading};

/// Shape of the current-conditions response; only `main.temp` is consumed.
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainSection,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    /// Temperature in Kelvin
    temp: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    api_url: Url,
    api_key: String,
}

impl WeatherProvider {
    pub fn new(api_url: Url, api_key: String, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            api_url,
            api_key,
        })
    }

    /// Fetch current conditions for the given location and normalize them
    /// to the reading the watch displays.
    pub async fn current(&self, query: &LocationQuery) -> Result<WeatherReading, WeatherError> {
        let url = self.request_url(query);
        tracing::debug!(%url, "fetching current conditions");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let current: CurrentResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let temperature = kelvin_to_fahrenheit(current.main.temp);
        tracing::info!(temperature, "current conditions fetched");

        Ok(WeatherReading { temperature })
    }

    fn request_url(&self, query: &LocationQuery) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            match query {
                LocationQuery::Coordinates(position) => {
                    pairs.append_pair("lat", &position.latitude.to_string());
                    pairs.append_pair("lon", &position.longitude.to_string());
                }
                LocationQuery::City(name) => {
                    pairs.append_pair("q", name);
                }
            }
            pairs.append_pair("APPID", &self.api_key);
        }
        url
    }
}
