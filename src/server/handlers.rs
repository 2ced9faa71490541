use super::{error::ApiError, AppState};
use crate::backtest::BacktestReport;
use crate::demand::{self, DemandForecast};
use crate::forecast::{accuracy, model, AccuracyReport, PriceForecast};
use crate::market::MarketSummary;
use crate::strategy::tranche::{ContractAnalysis, TranchePlan};
use crate::strategy::SignalReport;
use crate::weather::WeatherReport;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_PRODUCT: &str = "baseload";
const DEFAULT_MARKET_DAYS: u32 = 7;
const DEFAULT_VOLUME_MWH: f64 = 1000.0;
const DEFAULT_DELIVERY_PERIOD: &str = "next-quarter";
const DEFAULT_COMPARE_HORIZON: u32 = 30;

/// `{"success": true, <payload fields>, "lastUpdated": ...}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
    pub last_updated: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            last_updated: Utc::now(),
        })
    }
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;
type QueryResult<T> = Result<Query<T>, QueryRejection>;

#[derive(Debug, Deserialize)]
pub struct MarketQuery {
    days: Option<u32>,
    product: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    product: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PredictionsQuery {
    horizon: Option<u32>,
    product: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccuracyQuery {
    days: Option<u32>,
    horizon: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DemandQuery {
    baseload: Option<f64>,
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsQuery {
    volume: Option<f64>,
    delivery_period: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    fixed_rate: Option<f64>,
    volume: Option<f64>,
    horizon: Option<u32>,
}

fn product(value: Option<String>) -> String {
    value.unwrap_or_else(|| DEFAULT_PRODUCT.to_string())
}

/// # GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// # GET /api/market?days&product
pub async fn get_market(
    State(state): State<Arc<AppState>>,
    query: QueryResult<MarketQuery>,
) -> ApiResult<MarketSummary> {
    let Query(query) = query?;
    let summary = state
        .service
        .market(
            query.days.unwrap_or(DEFAULT_MARKET_DAYS),
            &product(query.product),
        )
        .await
        .map_err(ApiError::with("Failed to fetch market data"))?;
    Ok(Envelope::ok(summary))
}

/// # GET /api/signals?product
pub async fn get_signals(
    State(state): State<Arc<AppState>>,
    query: QueryResult<ProductQuery>,
) -> ApiResult<SignalReport> {
    let Query(query) = query?;
    let report = state
        .service
        .signal(&product(query.product))
        .await
        .map_err(ApiError::with("Failed to generate signal"))?;
    Ok(Envelope::ok(report))
}

/// # GET /api/predictions?horizon&product
pub async fn get_predictions(
    State(state): State<Arc<AppState>>,
    query: QueryResult<PredictionsQuery>,
) -> ApiResult<PriceForecast> {
    let Query(query) = query?;
    let forecast = state
        .service
        .forecast(
            query.horizon.unwrap_or(model::DEFAULT_HORIZON),
            &product(query.product),
        )
        .await
        .map_err(ApiError::with("Failed to generate predictions"))?;
    Ok(Envelope::ok(forecast))
}

/// # GET /api/backtest
pub async fn get_backtest(State(state): State<Arc<AppState>>) -> ApiResult<BacktestReport> {
    let report = state
        .service
        .backtest()
        .await
        .map_err(ApiError::with("Failed to run backtest"))?;
    Ok(Envelope::ok(report))
}

/// # GET /api/forecast-accuracy?days&horizon
pub async fn get_forecast_accuracy(
    State(state): State<Arc<AppState>>,
    query: QueryResult<AccuracyQuery>,
) -> ApiResult<AccuracyReport> {
    let Query(query) = query?;
    let report = state
        .service
        .accuracy(
            query.days.unwrap_or(accuracy::DEFAULT_DAYS),
            query.horizon.unwrap_or(accuracy::DEFAULT_HORIZON),
        )
        .await
        .map_err(ApiError::with("Failed to run forecast accuracy backtest"))?;
    Ok(Envelope::ok(report))
}

/// # GET /api/weather
pub async fn get_weather(State(state): State<Arc<AppState>>) -> ApiResult<WeatherReport> {
    let report = state
        .service
        .weather()
        .await
        .map_err(ApiError::with("Failed to fetch weather data"))?;
    Ok(Envelope::ok(report))
}

/// # GET /api/demand?baseload&days
pub async fn get_demand(
    State(state): State<Arc<AppState>>,
    query: QueryResult<DemandQuery>,
) -> ApiResult<DemandForecast> {
    let Query(query) = query?;
    let forecast = state
        .service
        .demand(
            query.baseload.unwrap_or(1.0),
            query.days.unwrap_or(demand::DEFAULT_DAYS),
        )
        .await
        .map_err(ApiError::with("Failed to generate demand forecast"))?;
    Ok(Envelope::ok(forecast))
}

/// # GET /api/recommendations?volume&deliveryPeriod
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    query: QueryResult<RecommendationsQuery>,
) -> ApiResult<TranchePlan> {
    let Query(query) = query?;
    let delivery_period = query
        .delivery_period
        .unwrap_or_else(|| DEFAULT_DELIVERY_PERIOD.to_string());
    let plan = state
        .service
        .recommendations(query.volume.unwrap_or(DEFAULT_VOLUME_MWH), &delivery_period)
        .await
        .map_err(ApiError::with("Failed to generate recommendations"))?;
    Ok(Envelope::ok(plan))
}

/// # GET /api/compare?fixedRate&volume&horizon
///
/// `fixedRate` has no default; leaving it out is a bad request.
pub async fn get_compare(
    State(state): State<Arc<AppState>>,
    query: QueryResult<CompareQuery>,
) -> ApiResult<ContractAnalysis> {
    let Query(query) = query?;
    let summary = "Failed to compare contracts";
    let fixed_rate = query.fixed_rate.ok_or_else(|| {
        ApiError::new(
            summary,
            crate::ServiceError::InvalidInput("fixedRate is required".to_string()),
        )
    })?;
    let analysis = state
        .service
        .compare(
            fixed_rate,
            query.volume.unwrap_or(DEFAULT_VOLUME_MWH),
            query.horizon.unwrap_or(DEFAULT_COMPARE_HORIZON),
        )
        .await
        .map_err(ApiError::with(summary))?;
    Ok(Envelope::ok(analysis))
}
