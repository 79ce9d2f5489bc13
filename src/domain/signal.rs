//! Per-indicator trading decisions.
//!
//! Each decision is aligned to the indicator it reads. `Wait` marks the
//! positions where an input is still absent, so a warm-up bar is never
//! mistaken for a neutral reading.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{BollingerBands, IndicatorSeries, Macd, Stochastic};
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
    Wait,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Neutral => "NEUTRAL",
            Signal::Wait => "WAIT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    name: String,
    points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn new(name: impl Into<String>, points: Vec<SignalPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[SignalPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn signal_at(&self, index: usize) -> Option<Signal> {
        self.points.get(index).map(|p| p.signal)
    }
}

/// Thresholds and periods the decisions are taken with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParams {
    pub ma_fast: i64,
    pub ma_slow: i64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stochastic_oversold: f64,
    pub stochastic_overbought: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            ma_fast: 5,
            ma_slow: 20,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stochastic_oversold: 20.0,
            stochastic_overbought: 80.0,
        }
    }
}

pub const SIGNALS_LABEL: &str = "SIGNALS";

impl SignalParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.ma_fast <= 0 || self.ma_slow <= 0 {
            return Err(IndicatorError::invalid(
                SIGNALS_LABEL,
                "ma_fast and ma_slow must be at least 1",
            ));
        }
        if self.ma_fast >= self.ma_slow {
            return Err(IndicatorError::invalid(
                SIGNALS_LABEL,
                format!(
                    "ma_fast {} must be shorter than ma_slow {}",
                    self.ma_fast, self.ma_slow
                ),
            ));
        }
        check_band("rsi", self.rsi_oversold, self.rsi_overbought)?;
        check_band("stochastic", self.stochastic_oversold, self.stochastic_overbought)
    }

    pub fn ma_cross_name(&self) -> String {
        format!("MA_CROSS({},{})", self.ma_fast, self.ma_slow)
    }
}

fn check_band(prefix: &str, oversold: f64, overbought: f64) -> Result<(), IndicatorError> {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(oversold) || !in_range(overbought) {
        return Err(IndicatorError::invalid(
            SIGNALS_LABEL,
            format!("{prefix} thresholds must lie within [0, 100]"),
        ));
    }
    if oversold >= overbought {
        return Err(IndicatorError::invalid(
            SIGNALS_LABEL,
            format!("{prefix}_oversold {oversold} must be below {prefix}_overbought {overbought}"),
        ));
    }
    Ok(())
}

/// Decision name for an indicator column, e.g. `RSI(14)` → `RSI_DECISION(14)`.
fn decision_name(column: &str) -> String {
    match column.split_once('(') {
        Some((prefix, rest)) => format!("{prefix}_DECISION({rest}"),
        None => format!("{column}_DECISION"),
    }
}

fn build(name: String, dates: &[NaiveDate], decide: impl Fn(usize) -> Signal) -> SignalSeries {
    let points = dates
        .iter()
        .enumerate()
        .map(|(i, &date)| SignalPoint {
            date,
            signal: decide(i),
        })
        .collect();
    SignalSeries::new(name, points)
}

/// Fast average above slow → Buy, below → Sell.
pub fn crossover_signal(fast: &IndicatorSeries, slow: &IndicatorSeries, name: String) -> SignalSeries {
    build(name, &fast.dates(), |i| {
        match (fast.value_at(i), slow.value_at(i)) {
            (Some(f), Some(s)) if f > s => Signal::Buy,
            (Some(f), Some(s)) if f < s => Signal::Sell,
            (Some(_), Some(_)) => Signal::Neutral,
            _ => Signal::Wait,
        }
    })
}

/// Close on or below the lower band → Buy, on or above the upper band → Sell.
pub fn bollinger_signal(close: &IndicatorSeries, bands: &BollingerBands) -> SignalSeries {
    let name = decision_name(bands.middle.name()).replace("BB_MIDDLE", "BB");
    build(name, &close.dates(), |i| {
        match (close.value_at(i), bands.lower.value_at(i), bands.upper.value_at(i)) {
            (Some(c), Some(lower), Some(_)) if c <= lower => Signal::Buy,
            (Some(c), Some(_), Some(upper)) if c >= upper => Signal::Sell,
            (Some(_), Some(_), Some(_)) => Signal::Neutral,
            _ => Signal::Wait,
        }
    })
}

/// MACD line above its signal line → Buy, below → Sell.
pub fn macd_signal(macd: &Macd) -> SignalSeries {
    let name = decision_name(macd.line.name());
    build(name, &macd.line.dates(), |i| {
        match (macd.line.value_at(i), macd.signal.value_at(i)) {
            (Some(line), Some(signal)) if line > signal => Signal::Buy,
            (Some(line), Some(signal)) if line < signal => Signal::Sell,
            (Some(_), Some(_)) => Signal::Neutral,
            _ => Signal::Wait,
        }
    })
}

pub fn rsi_signal(rsi: &IndicatorSeries, oversold: f64, overbought: f64) -> SignalSeries {
    build(decision_name(rsi.name()), &rsi.dates(), |i| match rsi.value_at(i) {
        Some(v) if v < oversold => Signal::Buy,
        Some(v) if v > overbought => Signal::Sell,
        Some(_) => Signal::Neutral,
        None => Signal::Wait,
    })
}

/// Both %K and %D below oversold → Buy, both above overbought → Sell.
pub fn stochastic_signal(stoch: &Stochastic, oversold: f64, overbought: f64) -> SignalSeries {
    let name = decision_name(stoch.k.name()).replace("STOCH_K", "STOCH");
    build(name, &stoch.k.dates(), |i| {
        match (stoch.k.value_at(i), stoch.d.value_at(i)) {
            (Some(k), Some(d)) if k < oversold && d < oversold => Signal::Buy,
            (Some(k), Some(d)) if k > overbought && d > overbought => Signal::Sell,
            (Some(_), Some(_)) => Signal::Neutral,
            _ => Signal::Wait,
        }
    })
}
