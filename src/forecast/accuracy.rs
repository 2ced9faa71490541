use super::model::{TrendForecaster, MODEL_NAME};
use crate::indicators::mean;
use crate::market::daily_values;
use crate::models::{round_half_up, round_to, DailyPrice, Direction};
use crate::{Result, ServiceError};
use chrono::NaiveDate;
use serde::Serialize;

/// Days of history each replayed forecast is fitted on
pub const MIN_HISTORY_DAYS: usize = 28;
/// BMRS weeks fetched for the accuracy replay (history plus actuals)
pub const HISTORY_WEEKS: u32 = 8;
pub const DEFAULT_DAYS: u32 = 45;
pub const MAX_DAYS: u32 = 60;
pub const DEFAULT_HORIZON: u32 = 7;
pub const MAX_HORIZON: u32 = 14;

const RECENT_EXAMPLES: usize = 10;

/// One predicted-vs-actual comparison
#[derive(Debug, Clone)]
pub struct ForecastEvaluation {
    pub forecast_date: NaiveDate,
    pub horizon: usize,
    pub predicted: f64,
    pub actual: f64,
    pub error: f64,
    /// `None` when the actual price was zero
    pub percent_error: Option<f64>,
    pub direction_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: usize,
    pub forecasts_evaluated: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub mae: String,
    pub mape: String,
    pub directional: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub mae: f64,
    pub mape: f64,
    pub directional_accuracy: f64,
    pub interpretation: Interpretation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonMetrics {
    pub horizon: usize,
    pub mae: f64,
    pub mape: f64,
    pub directional_accuracy: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyExample {
    pub date: NaiveDate,
    pub horizon: String,
    pub predicted: f64,
    pub actual: f64,
    pub error: f64,
    pub direction: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    pub period: AccuracyPeriod,
    pub aggregate_metrics: AggregateMetrics,
    pub by_horizon: Vec<HorizonMetrics>,
    pub recent_examples: Vec<AccuracyExample>,
    pub model: &'static str,
}

/// Replay the forecaster over history and score it against what happened
///
/// Each origin `i` fits on the 28 days before it and predicts `horizon` days;
/// only the most recent `days` origins are scored.
pub fn evaluate(
    forecaster: &TrendForecaster,
    daily: &[DailyPrice],
    horizon: u32,
    days: u32,
) -> Result<AccuracyReport> {
    let horizon = horizon.clamp(1, MAX_HORIZON) as usize;
    let days = days.clamp(1, MAX_DAYS) as usize;
    let values = daily_values(daily);
    let n = values.len();

    let needed = MIN_HISTORY_DAYS + horizon + 1;
    if n < needed {
        return Err(ServiceError::InsufficientData { needed, got: n });
    }

    let origins: Vec<usize> = (MIN_HISTORY_DAYS..n - horizon).collect();
    let origins = &origins[origins.len().saturating_sub(days)..];

    let mut results = Vec::new();
    for &i in origins {
        let history = &values[i - MIN_HISTORY_DAYS..i];
        let base_price = history[history.len() - 1];
        let predictions = forecaster.predict(history, horizon)?;

        for (h, &predicted) in predictions.iter().enumerate() {
            let actual = values[i + h];
            let error = (predicted - actual).abs();
            let percent_error = (actual != 0.0).then(|| error / actual.abs() * 100.0);

            results.push(ForecastEvaluation {
                forecast_date: daily[i + h].date,
                horizon: h + 1,
                predicted,
                actual,
                error,
                percent_error,
                direction_correct: Direction::between(base_price, predicted)
                    == Direction::between(base_price, actual),
            });
        }
    }

    let (mae, mape, directional_accuracy) = score(&results);

    let by_horizon = (1..=horizon)
        .filter_map(|h| {
            let subset: Vec<ForecastEvaluation> =
                results.iter().filter(|r| r.horizon == h).cloned().collect();
            if subset.is_empty() {
                return None;
            }
            let (mae, mape, directional_accuracy) = score(&subset);
            Some(HorizonMetrics {
                horizon: h,
                mae: round_to(mae, 2),
                mape: round_to(mape, 2),
                directional_accuracy: round_to(directional_accuracy, 2),
                count: subset.len(),
            })
        })
        .collect();

    let recent_examples = results
        .iter()
        .skip(results.len().saturating_sub(RECENT_EXAMPLES))
        .map(|r| AccuracyExample {
            date: r.forecast_date,
            horizon: format!("{}d", r.horizon),
            predicted: round_to(r.predicted, 2),
            actual: round_to(r.actual, 2),
            error: round_to(r.error, 2),
            direction: if r.direction_correct { "✓" } else { "✗" },
        })
        .collect();

    tracing::info!(
        "Forecast accuracy over {} evaluations: MAE={:.2}, MAPE={:.2}%, direction={:.1}%",
        results.len(),
        mae,
        mape,
        directional_accuracy
    );

    Ok(AccuracyReport {
        period: AccuracyPeriod {
            start: daily[origins[0]].date,
            end: daily[n - 1].date,
            total_days: n,
            forecasts_evaluated: results.len(),
        },
        aggregate_metrics: AggregateMetrics {
            mae: round_to(mae, 2),
            mape: round_to(mape, 2),
            directional_accuracy: round_to(directional_accuracy, 2),
            interpretation: Interpretation {
                mae: format!("Average error of £{}/MWh", round_to(mae, 2)),
                mape: format!("{}% average percentage error", round_to(mape, 2)),
                directional: format!(
                    "{}% of the time we correctly predicted price direction",
                    round_half_up(directional_accuracy)
                ),
            },
        },
        by_horizon,
        recent_examples,
        model: MODEL_NAME,
    })
}

/// (MAE, MAPE, directional accuracy %) over a set of evaluations
fn score(results: &[ForecastEvaluation]) -> (f64, f64, f64) {
    if results.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let errors: Vec<f64> = results.iter().map(|r| r.error).collect();
    let percent_errors: Vec<f64> = results.iter().filter_map(|r| r.percent_error).collect();
    let correct = results.iter().filter(|r| r.direction_correct).count();

    (
        mean(&errors).unwrap_or(0.0),
        mean(&percent_errors).unwrap_or(0.0),
        correct as f64 / results.len() as f64 * 100.0,
    )
}
