use crate::forecast::ForecastConfig;
use crate::Result;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lobster.toml";

/// Environment variable prefix, e.g. `LOBSTER__SERVER__PORT=8080`
const ENV_PREFIX: &str = "LOBSTER";

/// Application settings
///
/// Layered as: struct defaults, then the optional TOML file, then
/// `LOBSTER__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub bmrs: BmrsSettings,
    pub weather: WeatherSettings,
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| crate::ServiceError::InvalidInput(format!("server address: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BmrsSettings {
    pub base_url: String,
    pub data_provider: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub requests_per_minute: u32,
}

impl Default for BmrsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://data.elexon.co.uk/bmrs/api/v1".to_string(),
            data_provider: "APXMIDP".to_string(), // APX Power UK mid price
            user_agent: "LobsterEnergy/1.0".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            backoff_base_ms: 1000,
            requests_per_minute: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub past_days: u32,
    pub forecast_days: u32,
    pub timeout_secs: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        // Roughly central England
        Self {
            base_url: "https://api.open-meteo.com/v1".to_string(),
            latitude: 52.5,
            longitude: -1.5,
            timezone: "Europe/London".to_string(),
            past_days: 7,
            forecast_days: 7,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_source = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        tracing::debug!(
            bmrs = %settings.bmrs.base_url,
            weather = %settings.weather.base_url,
            "Loaded settings"
        );

        Ok(settings)
    }
}
