use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One half-hourly market index observation from BMRS
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub start_time: DateTime<Utc>,
    pub price: f64, // £/MWh
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_provider: Option<String>,
}

/// Average of all observations that fall on one UTC calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub average: f64,
    pub samples: usize,
}

/// Procurement signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Wait,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Wait => "WAIT",
            Signal::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a forecast relative to the current price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    pub fn between(base: f64, value: f64) -> Self {
        if value > base {
            Direction::Up
        } else if value < base {
            Direction::Down
        } else {
            Direction::Stable
        }
    }
}

/// Short-term market trend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

/// Coarse impact band used by the weather heuristic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Band a value against two ascending thresholds (strictly greater-than)
    pub fn from_thresholds(value: f64, medium_above: f64, high_above: f64) -> Self {
        if value > high_above {
            Level::High
        } else if value > medium_above {
            Level::Medium
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PricePressure {
    Upward,
    Downward,
    Neutral,
}

/// Round to the nearest integer, ties towards +infinity, never `-0`
///
/// `f64::round` sends -2.5 to -3 and keeps the sign of a zero result, which
/// prints as "-0" in labels and JSON.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor() + 0.0
}

/// Round to a fixed number of decimal places, ties towards +infinity
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    round_half_up(value * factor) / factor + 0.0
}
