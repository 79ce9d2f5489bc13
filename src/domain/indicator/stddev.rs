//! Rolling standard deviation.
//!
//! Population standard deviation over n values.
//! STDDEV(n)[i] = sqrt(sum((V[i-j] - SMA(n)[i])^2 for j in 0..n-1) / n)
//! Warmup: first (n-1) positions are absent.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    window_mean, window_population_stddev, IndicatorSeries, IndicatorType,
};

pub fn rolling_stddev(source: &IndicatorSeries, period: usize) -> Result<IndicatorSeries, IndicatorError> {
    // Same period rule as the SMA the deviation is centred on.
    IndicatorType::Sma(period).validate().map_err(|_| {
        IndicatorError::invalid(format!("STDDEV({period})"), "period must be at least 1")
    })?;

    let values = source.values();
    let out = (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let mean = window_mean(window)?;
            window_population_stddev(window, mean)
        })
        .collect();

    Ok(IndicatorSeries::from_values(
        format!("STDDEV({period})"),
        &source.dates(),
        out,
    ))
}
