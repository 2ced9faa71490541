// Core modules
pub mod api;
pub mod backtest;
pub mod demand;
pub mod error;
pub mod forecast;
pub mod indicators;
pub mod market;
pub mod models;
pub mod server;
pub mod service;
pub mod settings;
pub mod strategy;
pub mod weather;

// Re-export commonly used types
pub use error::{Result, ServiceError};
pub use models::*;
pub use service::MarketService;
pub use settings::Settings;
pub use strategy::Strategy;
