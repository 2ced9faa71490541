// Weather impact heuristic: heating demand, wind and solar output -> price pressure

use crate::api::open_meteo::WeatherResponse;
use crate::models::{round_to, Level, PricePressure};
use chrono::NaiveDate;
use serde::Serialize;

/// UK heating degree day base temperature (°C)
pub const HDD_BASE_TEMP: f64 = 15.5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temperature: f64,
    pub wind_speed: f64,
    pub cloud_cover: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWeather {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_temp: f64,
    pub hdd: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub sunshine_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAnalysis {
    #[serde(rename = "avgHDD")]
    pub avg_hdd: f64,
    pub demand_impact: Level,
    pub wind_generation: Level,
    pub solar_generation: Level,
    pub price_pressure: PricePressure,
    pub summary: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub past_week: Vec<DayWeather>,
    pub forecast: Vec<DayWeather>,
    pub analysis: WeatherAnalysis,
}

/// Heating degree days for a daily mean temperature
pub fn heating_degree_days(avg_temp: f64) -> f64 {
    (HDD_BASE_TEMP - avg_temp).max(0.0)
}

/// Price pressure from demand and renewable output bands
pub fn price_pressure(demand: Level, wind: Level, solar: Level) -> PricePressure {
    if demand == Level::High && wind == Level::Low {
        PricePressure::Upward
    } else if demand == Level::Low && (wind == Level::High || solar == Level::High) {
        PricePressure::Downward
    } else {
        PricePressure::Neutral
    }
}

fn summary_for(pressure: PricePressure) -> &'static str {
    match pressure {
        PricePressure::Upward => "Cold weather + low wind expected. Prices likely to rise.",
        PricePressure::Downward => "Mild weather + good renewables. Prices likely to fall.",
        PricePressure::Neutral => "Normal conditions. No strong price signal from weather.",
    }
}

/// Per-day weather rows; days with an unreadable date are skipped
pub fn daily_rows(response: &WeatherResponse) -> Vec<DayWeather> {
    let daily = &response.daily;
    let value = |series: &[f64], i: usize| series.get(i).copied().unwrap_or(0.0);

    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, raw_date)| {
            let date = match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
                Ok(date) => date,
                Err(e) => {
                    tracing::warn!("Skipping weather day '{}': {}", raw_date, e);
                    return None;
                }
            };

            let max_temp = value(&daily.temperature_2m_max, i);
            let min_temp = value(&daily.temperature_2m_min, i);
            let avg_temp = (max_temp + min_temp) / 2.0;

            Some(DayWeather {
                date,
                max_temp,
                min_temp,
                avg_temp: round_to(avg_temp, 1),
                hdd: round_to(heating_degree_days(avg_temp), 1),
                wind_speed: value(&daily.wind_speed_10m_max, i),
                precipitation: value(&daily.precipitation_sum, i),
                sunshine_hours: round_to(value(&daily.sunshine_duration, i) / 3600.0, 1),
            })
        })
        .collect()
}

/// Split the daily rows around `today` and band the forecast days
///
/// Today appears in both the past week and the forecast.
pub fn analyze(response: &WeatherResponse, today: NaiveDate) -> WeatherReport {
    let rows = daily_rows(response);
    let past_week: Vec<DayWeather> = rows.iter().filter(|d| d.date <= today).cloned().collect();
    let forecast: Vec<DayWeather> = rows.into_iter().filter(|d| d.date >= today).collect();

    let average = |f: fn(&DayWeather) -> f64| {
        if forecast.is_empty() {
            0.0
        } else {
            forecast.iter().map(f).sum::<f64>() / forecast.len() as f64
        }
    };
    let avg_hdd = average(|d| d.hdd);
    let avg_wind = average(|d| d.wind_speed);
    let avg_sunshine = average(|d| d.sunshine_hours);

    let demand_impact = Level::from_thresholds(avg_hdd, 5.0, 10.0);
    let wind_generation = Level::from_thresholds(avg_wind, 20.0, 40.0);
    let solar_generation = Level::from_thresholds(avg_sunshine, 3.0, 6.0);
    let pressure = price_pressure(demand_impact, wind_generation, solar_generation);

    tracing::info!(
        "Weather: avg HDD {:.1}, wind {:.1} km/h, sunshine {:.1}h -> {:?} pressure",
        avg_hdd,
        avg_wind,
        avg_sunshine,
        pressure
    );

    WeatherReport {
        current: CurrentConditions {
            temperature: response.current.temperature_2m,
            wind_speed: response.current.wind_speed_10m,
            cloud_cover: response.current.cloud_cover,
            timestamp: response.current.time.clone(),
        },
        past_week,
        forecast,
        analysis: WeatherAnalysis {
            avg_hdd: round_to(avg_hdd, 1),
            demand_impact,
            wind_generation,
            solar_generation,
            price_pressure: pressure,
            summary: summary_for(pressure),
        },
    }
}
