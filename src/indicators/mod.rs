// Statistical indicators over daily price series
// Moving average, trend fitting, percentile ranking and dispersion

pub mod moving_average;
pub mod statistics;

pub use moving_average::{calculate_sma, mean};
pub use statistics::{
    linear_regression, percentile, percentile_rank, return_volatility, std_dev,
};
