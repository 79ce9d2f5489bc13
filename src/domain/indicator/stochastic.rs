//! Stochastic oscillator.
//!
//! %K[i] = 100 * (C[i] - LL) / (HH - LL) over the last k_period bars.
//! A flat window (HH == LL) yields %K = 0.
//! %D = SMA(%K, d_period).
//!
//! Default parameters: k_period=14, d_period=3
//! Warmup: %K from k_period-1, %D from k_period-1 + d_period-1.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::moving_average::sma_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

pub(crate) fn column_names(k_period: usize, d_period: usize) -> [String; 2] {
    [
        format!("STOCH_K({},{})", k_period, d_period),
        format!("STOCH_D({},{})", k_period, d_period),
    ]
}

pub fn stochastic(
    series: &PriceSeries,
    k_period: usize,
    d_period: usize,
) -> Result<Stochastic, IndicatorError> {
    IndicatorType::Stochastic { k_period, d_period }.validate()?;

    let points = series.points();
    let k_values = (0..points.len())
        .map(|i| {
            if i + 1 < k_period {
                return None;
            }
            let window = &points[i + 1 - k_period..=i];
            let highest = window.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = window.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
            let range = highest - lowest;
            if range == 0.0 {
                Some(0.0)
            } else {
                Some(100.0 * (points[i].close - lowest) / range)
            }
        })
        .collect();

    let [k_name, d_name] = column_names(k_period, d_period);
    let k = IndicatorSeries::from_values(k_name, &series.dates(), k_values);
    let d = sma_values(&k, d_period, d_name);

    Ok(Stochastic { k, d })
}
