use crate::backtest::metrics::{BacktestReport, TradeAction, TradeRecord};
use crate::market::daily_values;
use crate::models::DailyPrice;
use crate::strategy::Strategy;
use crate::{Result, ServiceError};

/// BMRS weeks fetched for a backtest
pub const BACKTEST_WEEKS: u32 = 4;
const RECENT_TRADES: usize = 10;

/// Replays a strategy over daily prices against buying every day
#[derive(Debug, Clone, Default)]
pub struct BacktestRunner {
    /// First day index that is traded; earlier days are lookback only.
    /// `None` starts once the strategy has its full lookback window.
    start_index: Option<usize>,
}

impl BacktestRunner {
    pub fn new(start_index: usize) -> Self {
        Self {
            start_index: Some(start_index),
        }
    }

    fn start_for<S: Strategy + ?Sized>(&self, strategy: &S) -> usize {
        self.start_index.unwrap_or_else(|| strategy.lookback_days())
    }

    /// Run a backtest with the given strategy over daily prices (oldest first)
    ///
    /// Each day from the start index the naive buyer purchases at the daily
    /// average; the strategy buys on BUY and HOLD and skips on WAIT.
    pub fn run<S: Strategy + ?Sized>(
        &self,
        strategy: &S,
        daily: &[DailyPrice],
    ) -> Result<BacktestReport> {
        let start_index = self.start_for(strategy);
        let needed = start_index + 1;
        if daily.len() < needed {
            return Err(ServiceError::InsufficientData {
                needed,
                got: daily.len(),
            });
        }

        tracing::info!(
            "Starting backtest: {} days, strategy '{}' trading from day {}",
            daily.len(),
            strategy.name(),
            start_index
        );

        let prices = daily_values(daily);

        let trades: Vec<TradeRecord> = (start_index..daily.len())
            .map(|i| {
                let signal = strategy.generate_signal(&prices, i);
                let action = TradeAction::for_signal(signal);
                tracing::debug!(
                    "{} @ £{:.2}: {} -> {:?}",
                    daily[i].date,
                    prices[i],
                    signal,
                    action
                );
                TradeRecord {
                    date: daily[i].date,
                    price: prices[i],
                    signal,
                    action,
                }
            })
            .collect();

        let report = BacktestReport::from_trades(trades, RECENT_TRADES).ok_or(
            ServiceError::InsufficientData {
                needed,
                got: daily.len(),
            },
        )?;

        tracing::info!(
            "Backtest complete: signal avg £{:.2} vs naive £{:.2} ({})",
            report.signal_strategy.avg_price,
            report.naive_strategy.avg_price,
            report.comparison.verdict
        );

        Ok(report)
    }
}
