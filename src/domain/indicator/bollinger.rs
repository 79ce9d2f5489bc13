//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1),
//! taken over the same window the middle band averages.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) positions are absent.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    window_mean, window_population_stddev, IndicatorSeries, IndicatorType,
};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_NUM_STD_DEV: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
    /// Deviation the bands were built from; not a table column.
    pub stddev: IndicatorSeries,
}

pub(crate) fn column_names(period: usize, num_std_dev: f64) -> [String; 3] {
    [
        format!("BB_UPPER({},{})", period, num_std_dev),
        format!("BB_MIDDLE({},{})", period, num_std_dev),
        format!("BB_LOWER({},{})", period, num_std_dev),
    ]
}

pub fn bollinger_bands(
    source: &IndicatorSeries,
    period: usize,
    num_std_dev: f64,
) -> Result<BollingerBands, IndicatorError> {
    IndicatorType::Bollinger {
        period,
        num_std_dev,
    }
    .validate()?;

    let values = source.values();
    let n = values.len();
    let mut upper = Vec::with_capacity(n);
    let mut middle = Vec::with_capacity(n);
    let mut lower = Vec::with_capacity(n);
    let mut stddev = Vec::with_capacity(n);

    for i in 0..n {
        let band = if i + 1 < period {
            None
        } else {
            let window = &values[i + 1 - period..=i];
            window_mean(window).and_then(|mid| {
                window_population_stddev(window, mid).map(|sd| (mid, sd))
            })
        };

        match band {
            Some((mid, sd)) => {
                upper.push(Some(mid + num_std_dev * sd));
                middle.push(Some(mid));
                lower.push(Some(mid - num_std_dev * sd));
                stddev.push(Some(sd));
            }
            None => {
                upper.push(None);
                middle.push(None);
                lower.push(None);
                stddev.push(None);
            }
        }
    }

    let dates = source.dates();
    let [upper_name, middle_name, lower_name] = column_names(period, num_std_dev);

    Ok(BollingerBands {
        upper: IndicatorSeries::from_values(upper_name, &dates, upper),
        middle: IndicatorSeries::from_values(middle_name, &dates, middle),
        lower: IndicatorSeries::from_values(lower_name, &dates, lower),
        stddev: IndicatorSeries::from_values(format!("STDDEV({period})"), &dates, stddev),
    })
}
