//! Indicator configuration surface and its INI mapping.
//!
//! Only shape is checked here (numbers parse, names are known). Periods are
//! read as signed integers so that a negative or zero period reaches the
//! engine's validation pass and surfaces as `InvalidParameter` attributed to
//! its indicator.

use crate::domain::error::{IndicatorError, TaError};
use crate::domain::indicator::{bollinger, macd, rsi, stochastic, IndicatorType};
use crate::domain::signal::SignalParams;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SMA_PERIODS: [i64; 4] = [5, 10, 20, 50];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub period: i64,
    pub num_std_dev: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: bollinger::DEFAULT_PERIOD as i64,
            num_std_dev: bollinger::DEFAULT_NUM_STD_DEV,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: i64,
    pub slow: i64,
    pub signal: i64,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: macd::DEFAULT_FAST as i64,
            slow: macd::DEFAULT_SLOW as i64,
            signal: macd::DEFAULT_SIGNAL as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticParams {
    pub k_period: i64,
    pub d_period: i64,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            k_period: stochastic::DEFAULT_K_PERIOD as i64,
            d_period: stochastic::DEFAULT_D_PERIOD as i64,
        }
    }
}

/// Which indicators to compute and with which parameters. `None` means the
/// indicator was not requested.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub sma: Vec<i64>,
    pub ema: Vec<i64>,
    pub bollinger: Option<BollingerParams>,
    pub macd: Option<MacdParams>,
    pub rsi: Option<i64>,
    pub stochastic: Option<StochasticParams>,
    pub signals: Option<SignalParams>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma: DEFAULT_SMA_PERIODS.to_vec(),
            ema: Vec::new(),
            bollinger: Some(BollingerParams::default()),
            macd: Some(MacdParams::default()),
            rsi: Some(rsi::DEFAULT_PERIOD as i64),
            stochastic: Some(StochasticParams::default()),
            signals: Some(SignalParams::default()),
        }
    }
}

impl IndicatorConfig {
    /// Requested indicators in output order, duplicates removed.
    ///
    /// An entry with a negative period cannot be represented as an
    /// `IndicatorType` and comes back as the `InvalidParameter` error the
    /// engine reports for it. Zero periods still build and are refused by
    /// `IndicatorType::validate`.
    pub fn indicator_types(&self) -> Vec<Result<IndicatorType, IndicatorError>> {
        let mut requested: Vec<(String, Result<IndicatorType, IndicatorError>)> = Vec::new();

        for &p in &self.sma {
            let label = format!("SMA({p})");
            let built = period(&label, "period", p).map(IndicatorType::Sma);
            requested.push((label, built));
        }
        for &p in &self.ema {
            let label = format!("EMA({p})");
            let built = period(&label, "period", p).map(IndicatorType::Ema);
            requested.push((label, built));
        }
        if let Some(b) = self.bollinger {
            let label = format!("BOLLINGER({},{})", b.period, b.num_std_dev);
            let built = period(&label, "period", b.period).map(|period| IndicatorType::Bollinger {
                period,
                num_std_dev: b.num_std_dev,
            });
            requested.push((label, built));
        }
        if let Some(m) = self.macd {
            let label = format!("MACD({},{},{})", m.fast, m.slow, m.signal);
            let built = period(&label, "fast", m.fast).and_then(|fast| {
                Ok(IndicatorType::Macd {
                    fast,
                    slow: period(&label, "slow", m.slow)?,
                    signal: period(&label, "signal", m.signal)?,
                })
            });
            requested.push((label, built));
        }
        if let Some(p) = self.rsi {
            let label = format!("RSI({p})");
            let built = period(&label, "period", p).map(IndicatorType::Rsi);
            requested.push((label, built));
        }
        if let Some(s) = self.stochastic {
            let label = format!("STOCHASTIC({},{})", s.k_period, s.d_period);
            let built = period(&label, "k_period", s.k_period).and_then(|k_period| {
                Ok(IndicatorType::Stochastic {
                    k_period,
                    d_period: period(&label, "d_period", s.d_period)?,
                })
            });
            requested.push((label, built));
        }

        let mut seen: Vec<String> = Vec::new();
        requested
            .into_iter()
            .filter(|(label, _)| {
                if seen.contains(label) {
                    return false;
                }
                seen.push(label.clone());
                true
            })
            .map(|(_, built)| built)
            .collect()
    }
}

/// Labels match `IndicatorType`'s display form so rejections read the same
/// whichever check refused them.
fn period(label: &str, field: &str, value: i64) -> Result<usize, IndicatorError> {
    usize::try_from(value)
        .map_err(|_| IndicatorError::invalid(label, format!("{field} must be at least 1, got {value}")))
}

const KNOWN_INDICATORS: [&str; 6] = ["sma", "ema", "bollinger", "macd", "rsi", "stochastic"];

pub fn build_indicator_config(config: &dyn ConfigPort) -> Result<IndicatorConfig, TaError> {
    let compute = match config.get_list("indicators", "compute") {
        Some(names) => {
            let names: Vec<String> = names.into_iter().map(|n| n.to_lowercase()).collect();
            if let Some(unknown) = names.iter().find(|n| !KNOWN_INDICATORS.contains(&n.as_str())) {
                return Err(TaError::config_invalid(
                    "indicators",
                    "compute",
                    format!(
                        "unknown indicator '{}' (expected one of {})",
                        unknown,
                        KNOWN_INDICATORS.join(", ")
                    ),
                ));
            }
            names
        }
        None => KNOWN_INDICATORS.iter().map(|s| s.to_string()).collect(),
    };
    let wants = |name: &str| compute.iter().any(|n| n == name);

    let sma = if wants("sma") {
        parse_periods(config, "sma", &DEFAULT_SMA_PERIODS)?
    } else {
        Vec::new()
    };
    let ema = if wants("ema") {
        parse_periods(config, "ema", &[])?
    } else {
        Vec::new()
    };

    let bollinger = if wants("bollinger") {
        let defaults = BollingerParams::default();
        Some(BollingerParams {
            period: config.get_int("bollinger", "period", defaults.period)?,
            num_std_dev: config.get_f64("bollinger", "num_std_dev", defaults.num_std_dev)?,
        })
    } else {
        None
    };

    let macd = if wants("macd") {
        let defaults = MacdParams::default();
        Some(MacdParams {
            fast: config.get_int("macd", "fast", defaults.fast)?,
            slow: config.get_int("macd", "slow", defaults.slow)?,
            signal: config.get_int("macd", "signal", defaults.signal)?,
        })
    } else {
        None
    };

    let rsi = if wants("rsi") {
        Some(config.get_int("rsi", "period", rsi::DEFAULT_PERIOD as i64)?)
    } else {
        None
    };

    let stochastic = if wants("stochastic") {
        let defaults = StochasticParams::default();
        Some(StochasticParams {
            k_period: config.get_int("stochastic", "k_period", defaults.k_period)?,
            d_period: config.get_int("stochastic", "d_period", defaults.d_period)?,
        })
    } else {
        None
    };

    let signals = if config.get_bool("signals", "enabled", true)? {
        let d = SignalParams::default();
        Some(SignalParams {
            ma_fast: config.get_int("signals", "ma_fast", d.ma_fast)?,
            ma_slow: config.get_int("signals", "ma_slow", d.ma_slow)?,
            rsi_oversold: config.get_f64("signals", "rsi_oversold", d.rsi_oversold)?,
            rsi_overbought: config.get_f64("signals", "rsi_overbought", d.rsi_overbought)?,
            stochastic_oversold: config.get_f64("signals", "stochastic_oversold", d.stochastic_oversold)?,
            stochastic_overbought: config.get_f64(
                "signals",
                "stochastic_overbought",
                d.stochastic_overbought,
            )?,
        })
    } else {
        None
    };

    Ok(IndicatorConfig {
        sma,
        ema,
        bollinger,
        macd,
        rsi,
        stochastic,
        signals,
    })
}

fn parse_periods(config: &dyn ConfigPort, key: &str, default: &[i64]) -> Result<Vec<i64>, TaError> {
    match config.get_list("indicators", key) {
        None => Ok(default.to_vec()),
        Some(items) => items
            .iter()
            .map(|item| {
                item.parse::<i64>().map_err(|_| {
                    TaError::config_invalid(
                        "indicators",
                        key,
                        format!("expected integer periods, got '{item}'"),
                    )
                })
            })
            .collect(),
    }
}
