//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line starts at slow-1, the signal and histogram at
//! slow-1 + signal-1.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::moving_average::ema_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub(crate) fn column_names(fast: usize, slow: usize, signal: usize) -> [String; 3] {
    [
        format!("MACD({},{},{})", fast, slow, signal),
        format!("MACD_SIGNAL({},{},{})", fast, slow, signal),
        format!("MACD_HIST({},{},{})", fast, slow, signal),
    ]
}

pub fn macd(
    source: &IndicatorSeries,
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<Macd, IndicatorError> {
    IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    }
    .validate()?;

    let [line_name, signal_name, histogram_name] = column_names(fast, slow, signal_period);
    let dates = source.dates();

    let ema_fast = ema_values(source, fast, format!("EMA({fast})"));
    let ema_slow = ema_values(source, slow, format!("EMA({slow})"));

    let line_values = difference(&ema_fast.values(), &ema_slow.values());
    let line = IndicatorSeries::from_values(line_name, &dates, line_values);

    // The line is absent until slow-1, so the EMA seeds on its first
    // `signal_period` defined values and stays aligned to the full axis.
    let signal = ema_values(&line, signal_period, signal_name);

    let histogram_values = difference(&line.values(), &signal.values());
    let histogram = IndicatorSeries::from_values(histogram_name, &dates, histogram_values);

    Ok(Macd {
        line,
        signal,
        histogram,
    })
}

fn difference(left: &[Option<f64>], right: &[Option<f64>]) -> Vec<Option<f64>> {
    left.iter()
        .zip(right)
        .map(|(l, r)| Some((*l)? - (*r)?))
        .collect()
}
