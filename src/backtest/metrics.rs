use crate::models::{round_half_up, round_to, Signal};
use chrono::NaiveDate;
use serde::Serialize;

/// Hours in a year, used to scale £/MWh savings to one MW of baseload
const HOURS_PER_YEAR: f64 = 8760.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TradeAction {
    #[serde(rename = "BOUGHT")]
    Bought,
    #[serde(rename = "BOUGHT (market)")]
    BoughtAtMarket,
    #[serde(rename = "SKIPPED")]
    Skipped,
}

impl TradeAction {
    pub fn for_signal(signal: Signal) -> Self {
        match signal {
            Signal::Buy => TradeAction::Bought,
            Signal::Hold => TradeAction::BoughtAtMarket,
            Signal::Wait => TradeAction::Skipped,
        }
    }

    pub fn is_purchase(&self) -> bool {
        !matches!(self, TradeAction::Skipped)
    }
}

/// One simulated procurement day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub signal: Signal,
    pub action: TradeAction,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub trading_days: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalStrategyResult {
    pub avg_price: f64,
    pub buy_days: usize,
    pub skip_days: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NaiveStrategyResult {
    pub avg_price: f64,
    pub buy_days: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// Naive average minus signal average, £/MWh
    pub savings: f64,
    pub savings_percent: f64,
    #[serde(rename = "annualSavingsPerMW")]
    pub annual_savings_per_mw: f64,
    pub verdict: String,
}

/// Signal-following purchases compared with buying every day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub period: BacktestPeriod,
    pub signal_strategy: SignalStrategyResult,
    pub naive_strategy: NaiveStrategyResult,
    pub comparison: Comparison,
    pub recent_trades: Vec<TradeRecord>,
}

impl BacktestReport {
    /// Build the report from a full trade log (oldest first)
    ///
    /// Prices in the log are unrounded; rounding happens here.
    pub fn from_trades(trades: Vec<TradeRecord>, recent: usize) -> Option<Self> {
        let first = trades.first()?.date;
        let last = trades.last()?.date;

        let naive_days = trades.len();
        let naive_total: f64 = trades.iter().map(|t| t.price).sum();
        let naive_avg = naive_total / naive_days as f64;

        let bought: Vec<f64> = trades
            .iter()
            .filter(|t| t.action.is_purchase())
            .map(|t| t.price)
            .collect();
        let skip_days = naive_days - bought.len();
        let signal_avg = if bought.is_empty() {
            0.0
        } else {
            bought.iter().sum::<f64>() / bought.len() as f64
        };

        let savings = naive_avg - signal_avg;
        let savings_percent = if naive_avg > 0.0 {
            savings / naive_avg * 100.0
        } else {
            0.0
        };

        let verdict = if savings > 0.0 {
            "Signal strategy outperformed"
        } else {
            "Naive strategy outperformed"
        };

        let recent_trades = trades
            .iter()
            .skip(trades.len().saturating_sub(recent))
            .map(|t| TradeRecord {
                price: round_to(t.price, 2),
                ..t.clone()
            })
            .collect();

        Some(Self {
            period: BacktestPeriod {
                start: first,
                end: last,
                trading_days: naive_days,
            },
            signal_strategy: SignalStrategyResult {
                avg_price: round_to(signal_avg, 2),
                buy_days: bought.len(),
                skip_days,
            },
            naive_strategy: NaiveStrategyResult {
                avg_price: round_to(naive_avg, 2),
                buy_days: naive_days,
            },
            comparison: Comparison {
                savings: round_to(savings, 2),
                savings_percent: round_to(savings_percent, 2),
                annual_savings_per_mw: round_half_up(savings * HOURS_PER_YEAR),
                verdict: verdict.to_string(),
            },
            recent_trades,
        })
    }
}
