use thiserror::Error;

/// Errors surfaced by the market service and its computations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Upstream returned nothing usable
    #[error("No data from {0}")]
    NoData(String),

    #[error("Insufficient history: need at least {needed} daily prices, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
