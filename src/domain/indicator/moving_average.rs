//! Simple and exponential moving averages.
//!
//! SMA[i] = mean of the `period` values ending at i.
//! EMA: k = 2/(n+1), seed with the SMA of the first full window, then
//! EMA[i] = V[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) positions are absent.
//!
//! Both accept any indicator series, so they compose over derived series
//! (MACD line, %K). An absent input makes the output absent at that position;
//! the EMA then reseeds from the next full window of defined values.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{window_mean, IndicatorSeries, IndicatorType};

pub fn simple_moving_average(
    source: &IndicatorSeries,
    period: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    let indicator = IndicatorType::Sma(period);
    indicator.validate()?;
    Ok(sma_values(source, period, indicator.to_string()))
}

pub fn exponential_moving_average(
    source: &IndicatorSeries,
    period: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    let indicator = IndicatorType::Ema(period);
    indicator.validate()?;
    Ok(ema_values(source, period, indicator.to_string()))
}

/// SMA without parameter validation; `period` must be non-zero.
pub(crate) fn sma_values(source: &IndicatorSeries, period: usize, name: String) -> IndicatorSeries {
    let values = source.values();
    let out = (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                window_mean(&values[i + 1 - period..=i])
            }
        })
        .collect();
    IndicatorSeries::from_values(name, &source.dates(), out)
}

/// EMA without parameter validation; `period` must be non-zero.
pub(crate) fn ema_values(source: &IndicatorSeries, period: usize, name: String) -> IndicatorSeries {
    let values = source.values();
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for (i, value) in values.iter().enumerate() {
        let ema = match (*value, prev) {
            (None, _) => None,
            (Some(v), Some(e)) => Some(v * k + e * (1.0 - k)),
            (Some(_), None) if i + 1 >= period => window_mean(&values[i + 1 - period..=i]),
            (Some(_), None) => None,
        };
        prev = ema;
        out.push(ema);
    }

    IndicatorSeries::from_values(name, &source.dates(), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(values: &[Option<f64>]) -> IndicatorSeries {
        let dates: Vec<NaiveDate> = (0..values.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect();
        IndicatorSeries::from_values("CLOSE", &dates, values.to_vec())
    }

    fn closes(prices: &[f64]) -> IndicatorSeries {
        let values: Vec<Option<f64>> = prices.iter().copied().map(Some).collect();
        make_series(&values)
    }

    #[test]
    fn sma_warmup() {
        let series = simple_moving_average(&closes(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3).unwrap();

        assert_eq!(series.len(), 5);
        assert_eq!(series.value_at(0), None);
        assert_eq!(series.value_at(1), None);
        assert_eq!(series.value_at(2), Some(20.0));
        assert_eq!(series.value_at(3), Some(30.0));
        assert_eq!(series.value_at(4), Some(40.0));
        assert_eq!(series.name(), "SMA(3)");
    }

    #[test]
    fn sma_five_bars_period_five_has_single_value() {
        let source = closes(&[10.0, 11.0, 12.0, 13.0, 19.0]);
        let series = simple_moving_average(&source, 5).unwrap();

        assert_eq!(series.defined_count(), 1);
        assert_eq!(series.first_defined_index(), Some(4));
        assert_relative_eq!(series.value_at(4).unwrap(), 13.0);
    }

    #[test]
    fn sma_period_longer_than_series_is_all_absent() {
        let series = simple_moving_average(&closes(&[1.0, 2.0]), 5).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.defined_count(), 0);
    }

    #[test]
    fn sma_propagates_absent_window_values() {
        let source = make_series(&[Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)]);
        let series = simple_moving_average(&source, 2).unwrap();

        assert_eq!(
            series.values(),
            vec![None, None, None, Some(3.5), Some(4.5)]
        );
    }

    #[test]
    fn sma_period_0_is_invalid() {
        let err = simple_moving_average(&closes(&[1.0]), 0).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter { ref indicator, .. } if indicator == "SMA(0)"));
    }

    #[test]
    fn ema_warmup() {
        let series = exponential_moving_average(&closes(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3).unwrap();

        assert_eq!(series.value_at(0), None);
        assert_eq!(series.value_at(1), None);
        assert!(series.value_at(2).is_some());
        assert!(series.value_at(3).is_some());
        assert!(series.value_at(4).is_some());
        assert_eq!(series.name(), "EMA(3)");
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let series = exponential_moving_average(&closes(&[10.0, 20.0, 30.0]), 1).unwrap();
        assert_eq!(series.values(), vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn ema_seed_is_sma() {
        let source = closes(&[10.3, 20.7, 30.1, 12.9]);
        let ema = exponential_moving_average(&source, 3).unwrap();
        let sma = simple_moving_average(&source, 3).unwrap();

        assert_eq!(ema.value_at(2), sma.value_at(2));
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = exponential_moving_average(&closes(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3).unwrap();

        let k = 2.0 / 4.0;
        let sma = (10.0 + 20.0 + 30.0) / 3.0;
        let ema_3 = 40.0 * k + sma * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);

        assert_relative_eq!(series.value_at(2).unwrap(), sma);
        assert_relative_eq!(series.value_at(3).unwrap(), ema_3);
        assert_relative_eq!(series.value_at(4).unwrap(), ema_4);
    }

    #[test]
    fn ema_equal_prices() {
        let series = exponential_moving_average(&closes(&[100.0; 5]), 3).unwrap();
        for i in 2..5 {
            assert_relative_eq!(series.value_at(i).unwrap(), 100.0);
        }
    }

    #[test]
    fn ema_over_leading_absent_values_seeds_on_first_full_window() {
        let source = make_series(&[None, None, Some(2.0), Some(4.0), Some(6.0), Some(8.0)]);
        let series = exponential_moving_average(&source, 2).unwrap();

        assert_eq!(series.value_at(2), None);
        assert_eq!(series.value_at(3), Some(3.0));
        let k = 2.0 / 3.0;
        assert_relative_eq!(series.value_at(4).unwrap(), 6.0 * k + 3.0 * (1.0 - k));
    }

    #[test]
    fn ema_reseeds_after_gap() {
        let source = make_series(&[Some(1.0), Some(3.0), None, Some(5.0), Some(7.0)]);
        let series = exponential_moving_average(&source, 2).unwrap();

        assert_eq!(series.value_at(1), Some(2.0));
        assert_eq!(series.value_at(2), None);
        assert_eq!(series.value_at(3), None);
        assert_eq!(series.value_at(4), Some(6.0));
    }

    #[test]
    fn ema_empty_source() {
        let series = exponential_moving_average(&closes(&[]), 3).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn ema_period_0_is_invalid() {
        assert!(exponential_moving_average(&closes(&[10.0, 20.0]), 0).is_err());
    }

    #[test]
    fn output_keeps_source_dates() {
        let source = closes(&[1.0, 2.0, 3.0]);
        let series = exponential_moving_average(&source, 2).unwrap();
        assert_eq!(series.dates(), source.dates());
    }
}
