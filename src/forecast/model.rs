use crate::indicators::{linear_regression, mean, return_volatility};
use crate::market::daily_values;
use crate::models::{round_to, DailyPrice, Direction};
use crate::{Result, ServiceError};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MODEL_NAME: &str = "Smoothed Conservative (max 4%/day)";
pub const DEFAULT_HORIZON: u32 = 30;
pub const MAX_HORIZON: u32 = 90;

/// Tuning for the dampened-trend forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Fraction of the fitted slope kept (0.3 = trend influence cut by 70%)
    pub trend_dampening: f64,
    /// Largest day-over-day move as a fraction of the previous prediction
    pub max_daily_change: f64,
    /// Weight of the previous prediction in the exponential smoothing
    pub smoothing: f64,
    /// Mean-reversion weight added per forecast day
    pub mean_reversion_rate: f64,
    /// Cap on the mean-reversion weight
    pub max_mean_weight: f64,
    /// BMRS weeks fetched as forecast history
    pub history_weeks: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            trend_dampening: 0.3,
            max_daily_change: 0.04,
            smoothing: 0.7,
            mean_reversion_rate: 0.008,
            max_mean_weight: 0.3,
            history_weeks: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub confidence: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSummary {
    pub avg_predicted: f64,
    pub min_predicted: f64,
    pub max_predicted: f64,
    pub direction: Direction,
    pub percent_change: f64,
    /// Std-dev of historical day-over-day returns
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceForecast {
    pub product: String,
    pub horizon: String,
    pub current: f64,
    pub model: &'static str,
    pub summary: ForecastSummary,
    pub forecast: Vec<ForecastPoint>,
}

/// Dampened linear trend blended with mean reversion
///
/// Each step smooths towards the blended target and the move is clamped to
/// `max_daily_change` of the previous prediction, so forecasts drift slowly
/// rather than extrapolating the raw trend.
#[derive(Debug, Clone, Default)]
pub struct TrendForecaster {
    config: ForecastConfig,
}

impl TrendForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Raw daily predictions for `horizon` days after the end of `history`
    ///
    /// `history` is oldest first. Predictions are floored at zero.
    pub fn predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>> {
        let Some(&last) = history.last() else {
            return Err(ServiceError::InsufficientData { needed: 1, got: 0 });
        };

        let n = history.len() as f64;
        let (raw_slope, intercept) = linear_regression(history);
        let avg_price = mean(history).unwrap_or(last);
        let slope = raw_slope * self.config.trend_dampening;

        tracing::debug!(
            "Trend fit: raw_slope={:.4}, slope={:.4}, intercept={:.2}, mean={:.2}",
            raw_slope,
            slope,
            intercept,
            avg_price
        );

        let mut predictions = Vec::with_capacity(horizon);
        let mut previous = last;

        for i in 1..=horizon {
            let step = i as f64;
            let trend_value = intercept + slope * (n + step);
            let mean_weight =
                (step * self.config.mean_reversion_rate).min(self.config.max_mean_weight);
            let target = trend_value * (1.0 - mean_weight) + avg_price * mean_weight;

            let smoothed =
                self.config.smoothing * previous + (1.0 - self.config.smoothing) * target;

            // abs() keeps the band well-formed when prices go negative
            let max_change = previous.abs() * self.config.max_daily_change;
            let change = (smoothed - previous).clamp(-max_change, max_change);
            let clamped = previous + change;

            predictions.push(clamped.max(0.0));
            previous = clamped;
        }

        Ok(predictions)
    }

    /// Forecast response for `horizon` days starting the day after `today`
    pub fn build(
        &self,
        daily: &[DailyPrice],
        horizon: u32,
        today: NaiveDate,
        product: &str,
    ) -> Result<PriceForecast> {
        let horizon = horizon.clamp(1, MAX_HORIZON);
        let history = daily_values(daily);
        let current = *history
            .last()
            .ok_or(ServiceError::InsufficientData { needed: 1, got: 0 })?;

        let predictions: Vec<f64> = self
            .predict(&history, horizon as usize)?
            .into_iter()
            .map(|p| round_to(p, 2))
            .collect();

        let forecast: Vec<ForecastPoint> = predictions
            .iter()
            .enumerate()
            .map(|(i, &price)| ForecastPoint {
                date: today + Duration::days(i as i64 + 1),
                predicted: price,
                confidence: round_to(1.0 - (i as f64 * 0.01).min(0.5), 2),
                lower: round_to(price * 0.9, 2),
                upper: round_to(price * 1.1, 2),
            })
            .collect();

        let avg_predicted = mean(&predictions).unwrap_or(current);
        let min_predicted = predictions.iter().copied().fold(f64::INFINITY, f64::min);
        let max_predicted = predictions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let percent_change = if current != 0.0 {
            round_to((avg_predicted - current) / current * 100.0, 2)
        } else {
            0.0
        };

        tracing::info!(
            "Forecast {} days: current={:.2}, avg={:.2} ({:+.2}%)",
            horizon,
            current,
            avg_predicted,
            percent_change
        );

        Ok(PriceForecast {
            product: product.to_string(),
            horizon: format!("{} days", horizon),
            current: round_to(current, 2),
            model: MODEL_NAME,
            summary: ForecastSummary {
                avg_predicted: round_to(avg_predicted, 2),
                min_predicted: round_to(min_predicted, 2),
                max_predicted: round_to(max_predicted, 2),
                direction: Direction::between(current, avg_predicted),
                percent_change,
                volatility: round_to(return_volatility(&history), 4),
            },
            forecast,
        })
    }
}
