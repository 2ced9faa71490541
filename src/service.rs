use crate::api::{BmrsClient, OpenMeteoClient};
use crate::backtest::{BacktestReport, BacktestRunner, BACKTEST_WEEKS};
use crate::demand::{self, DemandForecast};
use crate::forecast::{self, AccuracyReport, PriceForecast, TrendForecaster};
use crate::market::{self, MarketSummary};
use crate::models::{DailyPrice, PricePoint};
use crate::settings::Settings;
use crate::strategy::tranche::{self, ContractAnalysis, TranchePlan};
use crate::strategy::{signals, PercentileStrategy, SignalConfig, SignalReport};
use crate::weather::{self, WeatherReport};
use crate::{Result, ServiceError};
use chrono::{DateTime, Utc};

/// BMRS weeks behind a live signal
pub const SIGNAL_WEEKS: u32 = 4;
/// Forecast days used to plan procurement tranches
pub const TRANCHE_HORIZON: u32 = 30;

/// Fetches upstream data and runs each computation over it
///
/// Every method reads the clock once and hands "now" down to pure code.
#[derive(Clone)]
pub struct MarketService {
    settings: Settings,
    bmrs: BmrsClient,
    weather: OpenMeteoClient,
    forecaster: TrendForecaster,
}

impl MarketService {
    pub fn new(settings: Settings) -> Result<Self> {
        let bmrs = BmrsClient::new(&settings.bmrs)?;
        let weather = OpenMeteoClient::new(&settings.weather)?;
        let forecaster = TrendForecaster::new(settings.forecast.clone());

        Ok(Self {
            settings,
            bmrs,
            weather,
            forecaster,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Half-hourly points, newest first; empty upstream is an error
    async fn fetch_points(&self, weeks: u32, now: DateTime<Utc>) -> Result<Vec<PricePoint>> {
        let points = self.bmrs.fetch_weeks(weeks, now).await?;
        if points.is_empty() {
            tracing::warn!("BMRS returned no prices for the last {} weeks", weeks);
            return Err(ServiceError::NoData("BMRS".to_string()));
        }
        Ok(points)
    }

    async fn fetch_daily(&self, weeks: u32, now: DateTime<Utc>) -> Result<Vec<DailyPrice>> {
        let points = self.fetch_points(weeks, now).await?;
        let daily = market::aggregate_daily(&points);
        tracing::info!(
            "Aggregated {} price points into {} daily averages",
            points.len(),
            daily.len()
        );
        Ok(daily)
    }

    pub async fn market(&self, days: u32, product: &str) -> Result<MarketSummary> {
        let now = Utc::now();
        let weeks = market::weeks_for_days(days);
        let points = self.fetch_points(weeks, now).await?;
        market::summarize(&points, product, weeks).ok_or(ServiceError::NoData("BMRS".to_string()))
    }

    pub async fn signal(&self, product: &str) -> Result<SignalReport> {
        let daily = self.fetch_daily(SIGNAL_WEEKS, Utc::now()).await?;
        signals::classify(&daily, product, &SignalConfig::default())
    }

    pub async fn forecast(&self, horizon: u32, product: &str) -> Result<PriceForecast> {
        let now = Utc::now();
        let daily = self
            .fetch_daily(self.forecaster.config().history_weeks, now)
            .await?;
        self.forecaster
            .build(&daily, horizon, now.date_naive(), product)
    }

    pub async fn backtest(&self) -> Result<BacktestReport> {
        let daily = self.fetch_daily(BACKTEST_WEEKS, Utc::now()).await?;
        BacktestRunner::default().run(&PercentileStrategy::default(), &daily)
    }

    pub async fn accuracy(&self, days: u32, horizon: u32) -> Result<AccuracyReport> {
        let daily = self
            .fetch_daily(forecast::accuracy::HISTORY_WEEKS, Utc::now())
            .await?;
        forecast::evaluate(&self.forecaster, &daily, horizon, days)
    }

    pub async fn weather(&self) -> Result<WeatherReport> {
        let now = Utc::now();
        let response = self.weather.get_forecast().await?;
        Ok(weather::analyze(&response, now.date_naive()))
    }

    pub async fn demand(&self, baseload_mw: f64, days: u32) -> Result<DemandForecast> {
        demand::generate(baseload_mw, days, Utc::now().date_naive())
    }

    /// Tranche plan for `volume_mwh` against the next 30 days of forecast
    pub async fn recommendations(
        &self,
        volume_mwh: f64,
        delivery_period: &str,
    ) -> Result<TranchePlan> {
        tranche::ensure_positive("volume", volume_mwh)?;
        let forecast = self.forecast(TRANCHE_HORIZON, "baseload").await?;
        tranche::recommend_tranches(
            forecast.current,
            &forecast.forecast,
            volume_mwh,
            delivery_period,
        )
    }

    pub async fn compare(
        &self,
        fixed_rate: f64,
        annual_volume_mwh: f64,
        horizon: u32,
    ) -> Result<ContractAnalysis> {
        tranche::ensure_positive("fixed rate", fixed_rate)?;
        tranche::ensure_positive("annual volume", annual_volume_mwh)?;
        let forecast = self.forecast(horizon, "baseload").await?;
        let predictions: Vec<f64> = forecast.forecast.iter().map(|p| p.predicted).collect();
        tranche::compare_fixed_vs_flexible(fixed_rate, &predictions, annual_volume_mwh)
    }
}
