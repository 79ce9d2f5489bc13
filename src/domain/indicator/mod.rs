//! Technical indicator implementations.
//!
//! This module provides the types shared by every calculator:
//! - `IndicatorPoint`: one dated value, absent during warm-up
//! - `IndicatorSeries`: a named series aligned to its source dates
//! - `IndicatorType`: indicator identity + parameters, with validation and
//!   the column names it produces

pub mod moving_average;
pub mod stddev;
pub mod bollinger;
pub mod macd;
pub mod rsi;
pub mod stochastic;

pub use bollinger::{bollinger_bands, BollingerBands};
pub use macd::{macd, Macd};
pub use moving_average::{exponential_moving_average, simple_moving_average};
pub use rsi::rsi;
pub use stddev::rolling_stddev;
pub use stochastic::{stochastic, Stochastic};

use crate::domain::error::IndicatorError;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub fn defined(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn absent(date: NaiveDate) -> Self {
        Self { date, value: None }
    }
}

/// A named series sharing the date axis of the price series it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    name: String,
    points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, points: Vec<IndicatorPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Zip `dates` with `values`. Both must have the same length.
    pub fn from_values(name: impl Into<String>, dates: &[NaiveDate], values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        let points = dates
            .iter()
            .zip(values)
            .map(|(&date, value)| IndicatorPoint { date, value })
            .collect();
        Self::new(name, points)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[IndicatorPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.points.get(index).and_then(|p| p.value)
    }

    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    pub fn first_defined_index(&self) -> Option<usize> {
        self.points.iter().position(|p| p.value.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Bollinger {
        period: usize,
        num_std_dev: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Rsi(usize),
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
}

impl IndicatorType {
    /// Structural parameter check, run before any computation.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        match *self {
            IndicatorType::Sma(period) | IndicatorType::Ema(period) | IndicatorType::Rsi(period) => {
                require_period(self, "period", period)
            }
            IndicatorType::Bollinger {
                period,
                num_std_dev,
            } => {
                require_period(self, "period", period)?;
                if !num_std_dev.is_finite() || num_std_dev < 0.0 {
                    return Err(IndicatorError::invalid(
                        self.to_string(),
                        format!("num_std_dev must be a non-negative number, got {num_std_dev}"),
                    ));
                }
                Ok(())
            }
            IndicatorType::Macd { fast, slow, signal } => {
                require_period(self, "fast", fast)?;
                require_period(self, "slow", slow)?;
                require_period(self, "signal", signal)?;
                if fast >= slow {
                    return Err(IndicatorError::invalid(
                        self.to_string(),
                        format!("fast period {fast} must be shorter than slow period {slow}"),
                    ));
                }
                Ok(())
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                require_period(self, "k_period", k_period)?;
                require_period(self, "d_period", d_period)
            }
        }
    }

    /// Names of the table columns this indicator produces, in output order.
    pub fn column_names(&self) -> Vec<String> {
        match *self {
            IndicatorType::Sma(_) | IndicatorType::Ema(_) | IndicatorType::Rsi(_) => {
                vec![self.to_string()]
            }
            IndicatorType::Bollinger {
                period,
                num_std_dev,
            } => bollinger::column_names(period, num_std_dev).to_vec(),
            IndicatorType::Macd { fast, slow, signal } => {
                macd::column_names(fast, slow, signal).to_vec()
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                stochastic::column_names(k_period, d_period).to_vec()
            }
        }
    }
}

fn require_period(indicator: &IndicatorType, field: &str, value: usize) -> Result<(), IndicatorError> {
    if value == 0 {
        return Err(IndicatorError::invalid(
            indicator.to_string(),
            format!("{field} must be at least 1"),
        ));
    }
    Ok(())
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Bollinger {
                period,
                num_std_dev,
            } => write!(f, "BOLLINGER({},{})", period, num_std_dev),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
        }
    }
}

/// Mean of a window, or `None` if any value in it is absent.
///
/// SMA and the EMA seed both go through here so the seed matches the SMA
/// bit for bit.
pub(crate) fn window_mean(window: &[Option<f64>]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let mut sum = 0.0;
    for value in window {
        sum += (*value)?;
    }
    Some(sum / window.len() as f64)
}

/// Population standard deviation of a fully defined window around `mean`.
pub(crate) fn window_population_stddev(window: &[Option<f64>], mean: f64) -> Option<f64> {
    let mut sum_sq = 0.0;
    for value in window {
        let diff = (*value)? - mean;
        sum_sq += diff * diff;
    }
    Some((sum_sq / window.len() as f64).sqrt())
}
