// Price forecasting: dampened trend model and its rolling accuracy harness
pub mod accuracy;
pub mod model;

pub use accuracy::{evaluate, AccuracyReport};
pub use model::{ForecastConfig, ForecastPoint, PriceForecast, TrendForecaster};
