use super::Strategy;
use crate::indicators::percentile_rank;
use crate::models::Signal;

/// Percentile band strategy used to replay signals over history
///
/// Ranks the day's price within the trailing window (inclusive of the day):
/// bottom quartile buys, top quartile waits, anything else holds.
#[derive(Debug, Clone)]
pub struct PercentileStrategy {
    config: PercentileConfig,
}

#[derive(Debug, Clone)]
pub struct PercentileConfig {
    /// Days looked back before the current day
    pub lookback_days: usize,
    /// Shortest window that produces a non-HOLD signal
    pub min_window: usize,
    pub buy_below: f64,
    pub wait_above: f64,
}

impl Default for PercentileConfig {
    fn default() -> Self {
        Self {
            lookback_days: 14,
            min_window: 7,
            buy_below: 25.0,
            wait_above: 75.0,
        }
    }
}

impl PercentileStrategy {
    pub fn new(config: PercentileConfig) -> Self {
        Self { config }
    }
}

impl Default for PercentileStrategy {
    fn default() -> Self {
        Self::new(PercentileConfig::default())
    }
}

impl Strategy for PercentileStrategy {
    fn generate_signal(&self, prices: &[f64], index: usize) -> Signal {
        let Some(&current) = prices.get(index) else {
            return Signal::Hold;
        };

        let start = index.saturating_sub(self.config.lookback_days);
        let window = &prices[start..=index];
        if window.len() < self.config.min_window {
            return Signal::Hold;
        }

        let percentile = percentile_rank(window, current);

        if percentile < self.config.buy_below {
            Signal::Buy
        } else if percentile > self.config.wait_above {
            Signal::Wait
        } else {
            Signal::Hold
        }
    }

    fn name(&self) -> &str {
        "Percentile Band"
    }

    fn lookback_days(&self) -> usize {
        self.config.lookback_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_window_holds() {
        let strategy = PercentileStrategy::default();
        let prices = vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 5.0];
        // index 5 has a window of 6 days
        assert_eq!(strategy.generate_signal(&prices, 5), Signal::Hold);
        // index 6 has 7 days and is the cheapest
        assert_eq!(strategy.generate_signal(&prices, 6), Signal::Buy);
    }

    #[test]
    fn test_expensive_day_waits() {
        let strategy = PercentileStrategy::default();
        let mut prices: Vec<f64> = (0..14).map(|i| 50.0 + i as f64).collect();
        prices.push(100.0);
        assert_eq!(strategy.generate_signal(&prices, 14), Signal::Wait);
    }

    #[test]
    fn test_window_is_capped_at_lookback() {
        let strategy = PercentileStrategy::default();
        // A very cheap day 20 days ago must fall outside the window
        let mut prices = vec![1.0];
        prices.extend(vec![50.0; 19]);
        prices.push(50.0);
        // window is 15 identical prices -> percentile 0 -> BUY
        assert_eq!(strategy.generate_signal(&prices, 20), Signal::Buy);

        prices[20] = 49.0;
        assert_eq!(strategy.generate_signal(&prices, 20), Signal::Buy);
        prices[20] = 51.0;
        assert_eq!(strategy.generate_signal(&prices, 20), Signal::Wait);
    }

    #[test]
    fn test_middle_of_range_holds() {
        let strategy = PercentileStrategy::default();
        let mut prices: Vec<f64> = (0..15).map(|i| 50.0 + i as f64).collect();
        // Move the median price to the current day
        prices.swap(7, 14);
        assert_eq!(strategy.generate_signal(&prices, 14), Signal::Hold);
    }

    #[test]
    fn test_out_of_range_index() {
        let strategy = PercentileStrategy::default();
        assert_eq!(strategy.generate_signal(&[1.0, 2.0], 5), Signal::Hold);
    }
}
