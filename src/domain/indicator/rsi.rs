//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over changes 1..=n
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both averages are 0 (no movement): RSI = 50, a neutral reading chosen
//! by convention; the formula itself is undefined there.
//!
//! Warmup: first n bars are absent (need n price changes).

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

pub const DEFAULT_PERIOD: usize = 14;

/// RSI reported when the window saw no price movement at all.
pub const FLAT_RSI: f64 = 50.0;

pub fn rsi(series: &PriceSeries, period: usize) -> Result<IndicatorSeries, IndicatorError> {
    let indicator = IndicatorType::Rsi(period);
    indicator.validate()?;

    let closes: Vec<f64> = series.points().iter().map(|p| p.close).collect();
    let mut values = vec![None; closes.len()];

    if closes.len() > period {
        let mut gains = vec![0.0; closes.len()];
        let mut losses = vec![0.0; closes.len()];
        for i in 1..closes.len() {
            let change = closes[i] - closes[i - 1];
            if change > 0.0 {
                gains[i] = change;
            } else if change < 0.0 {
                losses[i] = -change;
            }
        }

        let mut avg_gain = gains[1..=period].iter().sum::<f64>() / period as f64;
        let mut avg_loss = losses[1..=period].iter().sum::<f64>() / period as f64;
        values[period] = Some(rsi_value(avg_gain, avg_loss));

        for i in (period + 1)..closes.len() {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
            values[i] = Some(rsi_value(avg_gain, avg_loss));
        }
    }

    Ok(IndicatorSeries::from_values(
        indicator.to_string(),
        &series.dates(),
        values,
    ))
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { FLAT_RSI } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
