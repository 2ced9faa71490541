pub mod metrics;
pub mod runner;
pub mod synthetic;

pub use metrics::{BacktestReport, TradeAction, TradeRecord};
pub use runner::{BacktestRunner, BACKTEST_WEEKS};
pub use synthetic::{run_scenario, MarketScenario, SyntheticPriceGenerator};
