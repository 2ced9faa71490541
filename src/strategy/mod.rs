// Procurement strategies: live signal classifier, backtest strategy, tranche planning
pub mod percentile;
pub mod signals;
pub mod tranche;

use crate::models::Signal;

/// A rule that turns a daily price series into a signal for one day
pub trait Strategy: Send + Sync {
    /// Signal for `prices[index]`, looking only at `prices[..=index]`
    fn generate_signal(&self, prices: &[f64], index: usize) -> Signal;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Days of history the strategy looks back over
    fn lookback_days(&self) -> usize;
}

pub use percentile::PercentileStrategy;
pub use signals::{classify, SignalConfig, SignalReport};
pub use tranche::{compare_fixed_vs_flexible, recommend_tranches};
