use crate::backtest::runner::BacktestRunner;
use crate::market::PERIODS_PER_DAY;
use crate::models::DailyPrice;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic daily prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MarketScenario {
    /// Steady rise, +2% a day with light noise
    Uptrend,
    /// Steady fall, -2% a day with light noise
    Downtrend,
    /// Mean-reverting around the base price
    Sideways,
    /// Large day-to-day swings (±8%)
    Volatile,
    /// Calm market with a scarcity spike two thirds of the way through
    Spike,
}

/// Generates seeded daily £/MWh series for offline backtests
pub struct SyntheticPriceGenerator {
    rng: StdRng,
    base_price: f64,
}

impl SyntheticPriceGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 75.0,
        }
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// `days` daily prices ending on `end` (oldest first)
    pub fn generate(&mut self, scenario: MarketScenario, days: usize, end: NaiveDate) -> Vec<DailyPrice> {
        let prices = match scenario {
            MarketScenario::Uptrend => self.trend(days, 0.02),
            MarketScenario::Downtrend => self.trend(days, -0.02),
            MarketScenario::Sideways => self.sideways(days),
            MarketScenario::Volatile => self.volatile(days),
            MarketScenario::Spike => self.spike(days),
        };

        let start = end - Duration::days(days as i64 - 1);
        prices
            .into_iter()
            .enumerate()
            .map(|(i, average)| DailyPrice {
                date: start + Duration::days(i as i64),
                average,
                samples: PERIODS_PER_DAY,
            })
            .collect()
    }

    /// Compounding drift with ±0.5% noise so the trend dominates
    fn trend(&mut self, days: usize, drift: f64) -> Vec<f64> {
        let mut price = self.base_price;
        (0..days)
            .map(|_| {
                let noise = self.rng.gen_range(-0.005..0.005);
                price *= 1.0 + drift + noise;
                price
            })
            .collect()
    }

    fn sideways(&mut self, days: usize) -> Vec<f64> {
        let mean_price = self.base_price;
        let mut price = self.base_price;
        (0..days)
            .map(|_| {
                // 10% pull to the mean
                let reversion = (mean_price - price) * 0.1;
                let noise = price * self.rng.gen_range(-0.02..0.02);
                price += reversion + noise;
                price
            })
            .collect()
    }

    fn volatile(&mut self, days: usize) -> Vec<f64> {
        let floor = self.base_price * 0.5;
        let mut price = self.base_price;
        (0..days)
            .map(|_| {
                price += price * self.rng.gen_range(-0.08..0.08);
                price = price.max(floor);
                price
            })
            .collect()
    }

    fn spike(&mut self, days: usize) -> Vec<f64> {
        let spike_day = days * 2 / 3;
        let mut calm = self.sideways(days);
        let mut excess = 0.0;
        for (i, price) in calm.iter_mut().enumerate() {
            if i == spike_day {
                excess = self.base_price * 1.5;
            }
            *price += excess;
            // Decays 30% a day after the spike
            excess *= 0.7;
        }
        calm
    }
}

/// Backtest a named scenario with the default percentile strategy
pub fn run_scenario(
    scenario: MarketScenario,
    days: usize,
    seed: u64,
    end: NaiveDate,
) -> crate::Result<crate::backtest::BacktestReport> {
    let mut gen = SyntheticPriceGenerator::new(seed);
    let daily = gen.generate(scenario, days, end);
    BacktestRunner::default().run(&crate::strategy::PercentileStrategy::default(), &daily)
}
