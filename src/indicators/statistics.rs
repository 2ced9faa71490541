/// Fit `y = intercept + slope * x` by ordinary least squares with x = 0..n-1
///
/// Returns `(slope, intercept)`. With fewer than two points (or a degenerate
/// denominator) the slope is zero and the intercept is the mean.
pub fn linear_regression(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (x, &y) in values.iter().enumerate() {
        let x = x as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if values.len() < 2 || denominator == 0.0 {
        return (0.0, sum_y / n);
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    (slope, intercept)
}

/// Percentile rank of `value` within `window` (0-100)
///
/// Position of the first element >= `value` in the ascending-sorted window,
/// as a percentage of the window length. A value above every element ranks 100.
pub fn percentile_rank(window: &[f64], value: f64) -> f64 {
    if window.is_empty() {
        return 0.0;
    }

    let mut sorted = window.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = sorted
        .iter()
        .position(|&p| p >= value)
        .unwrap_or(sorted.len());

    position as f64 / sorted.len() as f64 * 100.0
}

/// Linearly interpolated percentile (`p` in 0-100)
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Standard deviation of day-over-day fractional returns
pub fn return_volatility(values: &[f64]) -> f64 {
    let returns: Vec<f64> = values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    std_dev(&returns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_regression_exact_line() {
        let values = vec![10.0, 12.0, 14.0, 16.0];
        let (slope, intercept) = linear_regression(&values);
        assert!((slope - 2.0).abs() < 1e-9);
        assert!((intercept - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_regression_single_point() {
        let (slope, intercept) = linear_regression(&[42.0]);
        assert_eq!(slope, 0.0);
        assert_eq!(intercept, 42.0);
    }

    #[test]
    fn test_percentile_rank() {
        let window = vec![50.0, 10.0, 30.0, 20.0, 40.0];
        assert_eq!(percentile_rank(&window, 10.0), 0.0);
        assert_eq!(percentile_rank(&window, 30.0), 40.0);
        assert_eq!(percentile_rank(&window, 50.0), 80.0);
        assert_eq!(percentile_rank(&window, 99.0), 100.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        let p10 = percentile(&values, 10.0).unwrap();
        assert!((p10 - 1.4).abs() < 1e-9);
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_std_dev() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_return_volatility_flat_series() {
        assert_eq!(return_volatility(&[100.0, 100.0, 100.0]), 0.0);
        assert_eq!(return_volatility(&[100.0]), 0.0);
    }
}
