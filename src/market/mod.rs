// Market data shaping: daily aggregation and half-hourly summaries

use crate::indicators::mean;
use crate::models::{round_to, DailyPrice, PricePoint, Trend};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Half-hourly periods in a settlement day
pub const PERIODS_PER_DAY: usize = 48;

/// Latest points echoed back in a market response
pub const MAX_RETURNED_POINTS: usize = 168;

/// Longest history the market endpoint will fetch
pub const MAX_MARKET_DAYS: u32 = 28;

/// Average observations per UTC calendar day, oldest day first
pub fn aggregate_daily(points: &[PricePoint]) -> Vec<DailyPrice> {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for point in points {
        by_date
            .entry(point.start_time.date_naive())
            .or_default()
            .push(point.price);
    }

    by_date
        .into_iter()
        .map(|(date, prices)| DailyPrice {
            date,
            average: prices.iter().sum::<f64>() / prices.len() as f64,
            samples: prices.len(),
        })
        .collect()
}

/// Daily averages as a plain series, oldest first
pub fn daily_values(daily: &[DailyPrice]) -> Vec<f64> {
    daily.iter().map(|d| d.average).collect()
}

/// Number of 7-day BMRS windows needed to cover `days` (capped at 28 days)
pub fn weeks_for_days(days: u32) -> u32 {
    let days = days.clamp(1, MAX_MARKET_DAYS);
    days.div_ceil(7)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPrice {
    pub price: f64,
    pub unit: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
}

/// One half-hourly price as returned by `/api/market`
#[derive(Debug, Clone, Serialize)]
pub struct MarketPrice {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub product: String,
    pub source: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub product: String,
    pub period: String,
    pub current: CurrentPrice,
    pub stats: MarketStats,
    pub prices: Vec<MarketPrice>,
    pub total_records: usize,
}

/// Latest day vs the day before: >2% up is rising, >2% down is falling
pub fn classify_trend(points_newest_first: &[f64]) -> Trend {
    let recent_end = points_newest_first.len().min(PERIODS_PER_DAY);
    let older_end = points_newest_first.len().min(PERIODS_PER_DAY * 2);

    let recent_avg = mean(&points_newest_first[..recent_end]).unwrap_or(0.0);
    let older_avg =
        mean(&points_newest_first[recent_end..older_end]).unwrap_or(recent_avg);

    if recent_avg > older_avg * 1.02 {
        Trend::Rising
    } else if recent_avg < older_avg * 0.98 {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

/// Summarise half-hourly points (newest first); `None` when empty
pub fn summarize(points: &[PricePoint], product: &str, weeks: u32) -> Option<MarketSummary> {
    let latest = points.first()?;
    let values: Vec<f64> = points.iter().map(|p| p.price).collect();

    let average = mean(&values)?;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let trend = classify_trend(&values);

    tracing::debug!(
        "Market summary: current={:.2}, avg={:.2}, trend={:?}",
        latest.price,
        average,
        trend
    );

    Some(MarketSummary {
        product: product.to_string(),
        period: format!("{} days", weeks * 7),
        current: CurrentPrice {
            price: round_to(latest.price, 2),
            unit: "£/MWh",
            timestamp: latest.start_time,
        },
        stats: MarketStats {
            average: round_to(average, 2),
            min: round_to(min, 2),
            max: round_to(max, 2),
            trend,
        },
        prices: points
            .iter()
            .take(MAX_RETURNED_POINTS)
            .map(|p| MarketPrice {
                timestamp: p.start_time,
                price: p.price,
                product: product.to_string(),
                source: "BMRS",
            })
            .collect(),
        total_records: points.len(),
    })
}
