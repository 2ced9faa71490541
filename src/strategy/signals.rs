use crate::indicators::{calculate_sma, mean, percentile_rank};
use crate::market::daily_values;
use crate::models::{round_half_up, round_to, DailyPrice, Signal};
use crate::{Result, ServiceError};
use serde::Serialize;

/// Premium a supplier typically charges to fix a rate
const FIXED_PREMIUM: f64 = 0.08;

/// Thresholds for the live signal classifier
#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Days in the short-term average and trend window
    pub short_window: usize,
    /// Percentile below which prices are "cheap"
    pub bottom_quartile: f64,
    /// Percentile below which a dip under the short average is a buy
    pub lower_range: f64,
    /// Fraction of the short average the price must be below for a dip buy
    pub dip_ratio: f64,
    /// Daily slope (£/MWh per day) that counts as a falling market
    pub falling_slope: f64,
    /// Percentile above which prices are "expensive"
    pub top_quartile: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            short_window: 7,
            bottom_quartile: 25.0,
            lower_range: 40.0,
            dip_ratio: 0.97,
            falling_slope: -1.0,
            top_quartile: 75.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceContext {
    pub current: f64,
    #[serde(rename = "avg30d")]
    pub avg_30d: f64,
    /// Only 30 days are fetched, so this mirrors `avg30d`
    #[serde(rename = "avg90d")]
    pub avg_90d: f64,
    pub percentile: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractComparison {
    pub fixed_rate: f64,
    pub flexible_estimate: f64,
    pub fixed_premium: String,
    pub potential_savings: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    pub product: String,
    pub signal: Signal,
    pub confidence: f64,
    pub reason: String,
    pub recommendation: String,
    pub price_context: PriceContext,
    pub contract_comparison: ContractComparison,
}

/// Classify the latest daily price against its recent history
///
/// `daily` is oldest first. Rules are checked in order; the first match wins.
pub fn classify(daily: &[DailyPrice], product: &str, config: &SignalConfig) -> Result<SignalReport> {
    let oldest_first = daily_values(daily);
    // Newest first for the short-window calculations
    let history: Vec<f64> = oldest_first.iter().rev().copied().collect();
    let current = *history
        .first()
        .ok_or_else(|| ServiceError::NoData("BMRS".to_string()))?;

    let short = &history[..history.len().min(config.short_window)];
    let avg_short = calculate_sma(&oldest_first, short.len()).unwrap_or(current);
    let avg_all = mean(&history).unwrap_or(current);
    let percentile = round_half_up(percentile_rank(&history, current));

    let trend_slope = if short.len() > 1 {
        (short[0] - short[short.len() - 1]) / short.len() as f64
    } else {
        0.0
    };

    tracing::debug!(
        "Signal inputs: current={:.2}, avg7d={:.2}, avg30d={:.2}, percentile={}, slope={:.3}",
        current,
        avg_short,
        avg_all,
        percentile,
        trend_slope
    );

    let (signal, confidence, reason, recommendation) =
        if percentile < config.bottom_quartile && trend_slope <= 0.0 {
            (
                Signal::Buy,
                0.8,
                "Price in bottom quartile with stable/falling trend",
                "Lock in rates now. Current prices are historically low.",
            )
        } else if percentile < config.lower_range && current < avg_short * config.dip_ratio {
            (
                Signal::Buy,
                0.65,
                "Price below recent average in lower range",
                "Good opportunity for partial procurement.",
            )
        } else if trend_slope < config.falling_slope && percentile > config.lower_range {
            (
                Signal::Wait,
                0.6,
                "Prices trending downward",
                "Hold off - better rates likely coming.",
            )
        } else if percentile > config.top_quartile {
            (
                Signal::Wait,
                0.7,
                "Prices in top quartile - expensive",
                "Avoid long-term commitments at current rates.",
            )
        } else {
            (
                Signal::Hold,
                0.55,
                "Prices in normal range",
                "Consider flexible contract or wait for better signal.",
            )
        };

    tracing::info!(
        "Signal {} ({:.0}% confidence): {}",
        signal,
        confidence * 100.0,
        reason
    );

    // Annual savings per MW baseload, in £k: (£/MWh) x 8760 h / 1000
    let potential_savings = (signal == Signal::Buy)
        .then(|| format!("£{}k/MW/year", round_half_up((avg_all - current) * 8.76)));

    Ok(SignalReport {
        product: product.to_string(),
        signal,
        confidence,
        reason: reason.to_string(),
        recommendation: recommendation.to_string(),
        price_context: PriceContext {
            current: round_to(current, 2),
            avg_30d: round_to(avg_all, 2),
            avg_90d: round_to(avg_all, 2),
            percentile: percentile as u32,
        },
        contract_comparison: ContractComparison {
            fixed_rate: round_to(current * (1.0 + FIXED_PREMIUM), 2),
            flexible_estimate: round_to(avg_all, 2),
            fixed_premium: format!("{}%", round_half_up(FIXED_PREMIUM * 100.0)),
            potential_savings,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    /// Build a daily series from values given oldest first
    fn daily_series(values: &[f64]) -> Vec<DailyPrice> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| DailyPrice {
                date: start + Duration::days(i as i64),
                average: v,
                samples: 48,
            })
            .collect()
    }

    #[test]
    fn test_buy_in_bottom_quartile_with_falling_trend() {
        // Declining market: today is the cheapest day
        let values: Vec<f64> = (0..28).map(|i| 120.0 - i as f64).collect();
        let report = classify(&daily_series(&values), "baseload", &SignalConfig::default()).unwrap();

        assert_eq!(report.signal, Signal::Buy);
        assert_eq!(report.confidence, 0.8);
        assert_eq!(report.price_context.percentile, 0);
        assert_eq!(report.price_context.current, 93.0);
        assert!(report.contract_comparison.potential_savings.is_some());
    }

    #[test]
    fn test_wait_in_top_quartile() {
        // Rising market: today is the most expensive day
        let values: Vec<f64> = (0..28).map(|i| 60.0 + i as f64).collect();
        let report = classify(&daily_series(&values), "baseload", &SignalConfig::default()).unwrap();

        assert_eq!(report.signal, Signal::Wait);
        assert_eq!(report.confidence, 0.7);
        assert_eq!(report.reason, "Prices in top quartile - expensive");
        assert!(report.contract_comparison.potential_savings.is_none());
    }

    #[test]
    fn test_wait_when_trending_down_from_high_range() {
        // Last 7 days fall steeply but remain above most of the month
        let mut values = vec![50.0; 21];
        values.extend([140.0, 130.0, 120.0, 110.0, 100.0, 90.0, 80.0]);
        let report = classify(&daily_series(&values), "baseload", &SignalConfig::default()).unwrap();

        // percentile of 80 = 21/28 = 75 (not top quartile); slope = (80-140)/7 < -1
        assert_eq!(report.price_context.percentile, 75);
        assert_eq!(report.signal, Signal::Wait);
        assert_eq!(report.confidence, 0.6);
    }

    #[test]
    fn test_buy_on_dip_below_short_average() {
        // Rising final week, then a sharp dip on the last day into the lower range
        let mut values: Vec<f64> = (0..20).map(|i| 60.0 + i as f64 * 2.0).collect();
        values.extend([100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 80.0]);
        let report = classify(&daily_series(&values), "baseload", &SignalConfig::default()).unwrap();

        // 80 ranks at index 10 of 27 -> 37%; slope (80-100)/7 < 0 but percentile >= 25
        assert_eq!(report.price_context.percentile, 37);
        assert_eq!(report.signal, Signal::Buy);
        assert_eq!(report.confidence, 0.65);
    }

    #[test]
    fn test_dip_buy_savings_just_below_zero_prints_zero() {
        // avg30d 100.47 sits a hair under today's 100.5
        let mut values = vec![81.4; 3];
        values.extend([110.0; 6]);
        values.push(100.5);
        let report = classify(&daily_series(&values), "baseload", &SignalConfig::default()).unwrap();

        assert_eq!(report.price_context.percentile, 30);
        assert_eq!(report.signal, Signal::Buy);
        assert_eq!(report.price_context.avg_30d, 100.47);
        assert_eq!(
            report.contract_comparison.potential_savings.as_deref(),
            Some("£0k/MW/year")
        );
    }

    #[test]
    fn test_hold_in_normal_range() {
        let mut values = vec![50.0, 100.0].repeat(10);
        values.extend([75.0; 8]);
        let report = classify(&daily_series(&values), "baseload", &SignalConfig::default()).unwrap();

        assert_eq!(report.signal, Signal::Hold);
        assert_eq!(report.confidence, 0.55);
    }

    #[test]
    fn test_contract_comparison() {
        let values = vec![100.0; 10];
        let report = classify(&daily_series(&values), "peak", &SignalConfig::default()).unwrap();

        assert_eq!(report.product, "peak");
        assert_eq!(report.contract_comparison.fixed_rate, 108.0);
        assert_eq!(report.contract_comparison.flexible_estimate, 100.0);
        assert_eq!(report.contract_comparison.fixed_premium, "8%");
        assert_eq!(report.price_context.avg_90d, report.price_context.avg_30d);
    }

    #[test]
    fn test_empty_history_is_no_data() {
        let result = classify(&[], "baseload", &SignalConfig::default());
        assert!(matches!(result, Err(ServiceError::NoData(_))));
    }
}
