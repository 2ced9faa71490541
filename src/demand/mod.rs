// Synthetic site demand profile built from typical UK load shapes

use crate::models::{round_half_up, round_to};
use crate::{Result, ServiceError};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;

/// Demand at each hour relative to the daily average
pub const HOURLY_PATTERN: [f64; 24] = [
    0.65, 0.60, 0.58, 0.57, 0.58, 0.65, // 00-05
    0.80, 0.95, 1.05, 1.10, 1.12, 1.10, // 06-11
    1.08, 1.05, 1.02, 1.05, 1.15, 1.25, // 12-17
    1.30, 1.20, 1.10, 0.95, 0.85, 0.75, // 18-23
];

/// Monday first
pub const DAY_FACTORS: [f64; 7] = [1.05, 1.08, 1.08, 1.06, 1.02, 0.85, 0.80];

/// January first
pub const MONTH_FACTORS: [f64; 12] = [
    1.25, 1.20, 1.10, 0.95, 0.85, 0.80, 0.78, 0.80, 0.88, 1.00, 1.15, 1.25,
];

pub const DEFAULT_DAYS: u32 = 7;
pub const MAX_DAYS: u32 = 14;
const RETURNED_HOURS: usize = 72;

/// Share of load assumed shiftable and the peak/off-peak spread, for savings
const SHIFTABLE_SHARE: f64 = 0.25;
const FLEX_SPREAD: f64 = 0.15;
/// Rough £/MWh used to value shifted energy
const REFERENCE_PRICE: f64 = 90.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceImpact {
    Peak,
    Day,
    Night,
}

impl PriceImpact {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            16..=19 => PriceImpact::Peak,
            7..=21 => PriceImpact::Day,
            _ => PriceImpact::Night,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyDemand {
    pub datetime: DateTime<Utc>,
    pub hour: u32,
    pub day_of_week: String,
    #[serde(rename = "demandMW")]
    pub demand_mw: f64,
    pub relative_demand: f64,
    pub price_impact: PriceImpact,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyDemand {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub peak_demand: f64,
    pub min_demand: f64,
    pub avg_demand: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Flexibility {
    pub peak_hours: &'static str,
    pub off_peak_hours: &'static str,
    pub avg_peak_demand: f64,
    pub avg_off_peak_demand: f64,
    #[serde(rename = "shiftableMW")]
    pub shiftable_mw: f64,
    pub potential_annual_savings: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandForecast {
    #[serde(rename = "baseloadMW")]
    pub baseload_mw: f64,
    pub forecast_days: u32,
    /// First three days, hourly
    pub forecast: Vec<HourlyDemand>,
    pub daily_summary: Vec<DailyDemand>,
    pub flexibility: Flexibility,
    pub recommendations: Vec<String>,
}

fn day_name(weekday: Weekday) -> String {
    weekday.to_string()
}

/// Relative demand for one hour of one day
pub fn relative_demand(date: NaiveDate, hour: u32) -> f64 {
    let hour_factor = HOURLY_PATTERN[hour as usize % 24];
    let day_factor = DAY_FACTORS[date.weekday().num_days_from_monday() as usize];
    let month_factor = MONTH_FACTORS[date.month0() as usize];
    hour_factor * day_factor * month_factor
}

/// Hourly demand for `days` days starting at `start` (UTC dates and hours)
///
/// `days` is clamped to 1..=14; `baseload_mw` must be finite and non-negative.
pub fn generate(baseload_mw: f64, days: u32, start: NaiveDate) -> Result<DemandForecast> {
    if !baseload_mw.is_finite() || baseload_mw < 0.0 {
        return Err(ServiceError::InvalidInput(format!(
            "baseload must be a non-negative number of MW, got {}",
            baseload_mw
        )));
    }
    let days = days.clamp(1, MAX_DAYS);

    let mut hourly = Vec::with_capacity(days as usize * 24);
    for d in 0..days {
        let date = start + Duration::days(d as i64);
        for hour in 0..24u32 {
            let relative = relative_demand(date, hour);
            let datetime = date
                .and_hms_opt(hour, 0, 0)
                .map(|dt| dt.and_utc())
                .ok_or_else(|| ServiceError::InvalidInput(format!("invalid hour {}", hour)))?;

            hourly.push(HourlyDemand {
                datetime,
                hour,
                day_of_week: day_name(date.weekday()),
                demand_mw: round_to(baseload_mw * relative, 3),
                relative_demand: round_to(relative, 2),
                price_impact: PriceImpact::for_hour(hour),
            });
        }
    }

    let daily_summary = hourly
        .chunks(24)
        .zip(0..)
        .map(|(day, d)| {
            let date = start + Duration::days(d);
            let demands = day.iter().map(|h| h.demand_mw);
            DailyDemand {
                date,
                day_of_week: day_name(date.weekday()),
                peak_demand: round_to(demands.clone().fold(f64::NEG_INFINITY, f64::max), 3),
                min_demand: round_to(demands.clone().fold(f64::INFINITY, f64::min), 3),
                avg_demand: round_to(demands.sum::<f64>() / 24.0, 3),
            }
        })
        .collect();

    let average_for = |impact: PriceImpact| {
        let matching: Vec<f64> = hourly
            .iter()
            .filter(|h| h.price_impact == impact)
            .map(|h| h.demand_mw)
            .collect();
        matching.iter().sum::<f64>() / matching.len().max(1) as f64
    };
    let avg_peak = average_for(PriceImpact::Peak);
    let avg_off_peak = average_for(PriceImpact::Night);
    let shiftable = avg_peak - avg_off_peak;
    let annual_savings = shiftable * 8760.0 * SHIFTABLE_SHARE * FLEX_SPREAD * REFERENCE_PRICE;

    let mut recommendations = Vec::new();
    if shiftable > 0.1 {
        recommendations.push(format!(
            "Shift {} MW from peak to off-peak",
            round_to(shiftable, 2)
        ));
    }
    recommendations.push("Consider battery storage for peak shaving".to_string());
    recommendations.push("Review process schedules for overnight operation".to_string());

    tracing::debug!(
        "Demand profile: {} days, peak {:.3} MW, off-peak {:.3} MW",
        days,
        avg_peak,
        avg_off_peak
    );

    hourly.truncate(RETURNED_HOURS);

    Ok(DemandForecast {
        baseload_mw,
        forecast_days: days,
        forecast: hourly,
        daily_summary,
        flexibility: Flexibility {
            peak_hours: "16:00-20:00",
            off_peak_hours: "23:00-06:00",
            avg_peak_demand: round_to(avg_peak, 3),
            avg_off_peak_demand: round_to(avg_off_peak, 3),
            shiftable_mw: round_to(shiftable, 3),
            potential_annual_savings: round_half_up(annual_savings),
        },
        recommendations,
    })
}
