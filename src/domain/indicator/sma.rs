//! Simple Moving Average.
//!
//! SMA(n) at point i = mean of values[i-n+1..=i].
//! Warmup: the first (n-1) points are null.

/// SMA of the last `period` values of `values`.
pub fn sma_last(values: &[Option<f64>], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let mut sum = 0.0;
    for v in &values[values.len() - period..] {
        sum += (*v)?;
    }
    Some(sum / period as f64)
}

/// SMA at every point of `values`.
pub fn rolling_sma(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| sma_last(&values[..=i], period))
        .collect()
}
