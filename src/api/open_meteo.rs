use crate::settings::WeatherSettings;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Deserializer};

const CURRENT_FIELDS: &str = "temperature_2m,wind_speed_10m,cloud_cover";
const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,wind_speed_10m_max,precipitation_sum,sunshine_duration";

/// Client for the Open-Meteo forecast API (free, no key needed)
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    settings: WeatherSettings,
}

/// Response from /forecast
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    pub current: CurrentWeather,
    pub daily: DailyWeather,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    pub time: String,
    #[serde(default)]
    pub temperature_2m: f64,
    #[serde(default)]
    pub wind_speed_10m: f64,
    #[serde(default)]
    pub cloud_cover: f64,
}

/// Column-oriented daily series; null entries read as 0
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyWeather {
    pub time: Vec<String>,
    #[serde(deserialize_with = "nullable_series")]
    pub temperature_2m_max: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    pub temperature_2m_min: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    pub wind_speed_10m_max: Vec<f64>,
    #[serde(deserialize_with = "nullable_series")]
    pub precipitation_sum: Vec<f64>,
    /// Seconds of sunshine per day
    #[serde(deserialize_with = "nullable_series")]
    pub sunshine_duration: Vec<f64>,
}

fn nullable_series<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

impl OpenMeteoClient {
    pub fn new(settings: &WeatherSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// Current conditions plus past and forecast daily weather
    pub async fn get_forecast(&self) -> Result<WeatherResponse> {
        let url = format!("{}/forecast", self.settings.base_url.trim_end_matches('/'));
        let query = [
            ("latitude", self.settings.latitude.to_string()),
            ("longitude", self.settings.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", self.settings.timezone.clone()),
            ("past_days", self.settings.past_days.to_string()),
            ("forecast_days", self.settings.forecast_days.to_string()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("Weather API request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Weather API failed ({})", response.status());
        }

        let weather: WeatherResponse = response
            .json()
            .await
            .context("Failed to parse weather response")?;

        tracing::debug!("Fetched {} days of weather", weather.daily.time.len());

        Ok(weather)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings(base_url: String) -> WeatherSettings {
        WeatherSettings {
            base_url,
            ..WeatherSettings::default()
        }
    }

    #[tokio::test]
    async fn test_get_forecast_parses_nulls_as_zero() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/forecast")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("latitude".into(), "52.5".into()),
                mockito::Matcher::UrlEncoded("timezone".into(), "Europe/London".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{
                    "current": {"time": "2025-01-10T12:00", "temperature_2m": 4.2, "wind_speed_10m": 18.0, "cloud_cover": 75},
                    "daily": {
                        "time": ["2025-01-10", "2025-01-11"],
                        "temperature_2m_max": [6.0, null],
                        "temperature_2m_min": [1.0, 2.0],
                        "wind_speed_10m_max": [25.0, 30.0],
                        "precipitation_sum": [0.0, 1.2],
                        "sunshine_duration": [7200.0, 3600.0]
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = OpenMeteoClient::new(&test_settings(server.url())).unwrap();
        let weather = client.get_forecast().await.unwrap();

        mock.assert_async().await;
        assert_eq!(weather.current.temperature_2m, 4.2);
        assert_eq!(weather.daily.time.len(), 2);
        assert_eq!(weather.daily.temperature_2m_max, vec![6.0, 0.0]);
    }

    #[tokio::test]
    async fn test_get_forecast_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/forecast")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = OpenMeteoClient::new(&test_settings(server.url())).unwrap();
        let err = client.get_forecast().await.unwrap_err();
        assert!(err.to_string().contains("Weather API failed"));
    }
}
