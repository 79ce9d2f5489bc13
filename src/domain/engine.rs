//! Indicator engine: runs every requested calculator over one or many
//! securities and assembles one `IndicatorTable` per security.
//!
//! Parameters are validated once, when the engine is built. Rejected
//! indicators are reported for every security instead of aborting the run;
//! the remaining indicators and securities are still computed.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    bollinger_bands, exponential_moving_average, macd, rsi, simple_moving_average, stochastic,
    BollingerBands, IndicatorSeries, IndicatorType, Macd, Stochastic,
};
use crate::domain::indicator_config::IndicatorConfig;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::domain::signal::{self, SignalParams, SIGNALS_LABEL};
use crate::domain::table::IndicatorTable;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Raw rows for one security, before the ordering checks of `PriceSeries`.
#[derive(Debug, Clone)]
pub struct SecurityInput {
    pub security: String,
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidParameter,
    MalformedInput,
    DataSource,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidParameter => write!(f, "invalid_parameter"),
            FailureKind::MalformedInput => write!(f, "malformed_input"),
            FailureKind::DataSource => write!(f, "data_source"),
        }
    }
}

/// One failed (security, indicator) pair. `indicator` is `None` when the
/// whole security failed before any calculator ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub security: String,
    pub indicator: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn from_error(security: &str, indicator: Option<&str>, error: &IndicatorError) -> Self {
        let kind = match error {
            IndicatorError::InvalidParameter { .. } => FailureKind::InvalidParameter,
            IndicatorError::MalformedInput { .. } => FailureKind::MalformedInput,
        };
        Self {
            security: security.to_string(),
            indicator: indicator.map(str::to_string),
            kind,
            message: error.to_string(),
        }
    }

    pub fn data_source(security: &str, message: impl Into<String>) -> Self {
        Self {
            security: security.to_string(),
            indicator: None,
            kind: FailureKind::DataSource,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.indicator {
            Some(indicator) => write!(f, "{} {}: {}", self.security, indicator, self.message),
            None => write!(f, "{}: {}", self.security, self.message),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub tables: Vec<IndicatorTable>,
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A configuration entry refused by the validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub indicator: String,
    pub error: IndicatorError,
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    plan: Vec<IndicatorType>,
    signals: Option<SignalParams>,
    rejected: Vec<Rejection>,
}

impl IndicatorEngine {
    /// Build the engine and run the validation pass over `config`.
    pub fn new(config: &IndicatorConfig) -> Self {
        let mut plan = Vec::new();
        let mut rejected = Vec::new();

        for requested in config.indicator_types() {
            match requested.and_then(|indicator| indicator.validate().map(|()| indicator)) {
                Ok(indicator) => plan.push(indicator),
                Err(error) => rejected.push(Rejection {
                    indicator: error.subject().to_string(),
                    error,
                }),
            }
        }

        let signals = match config.signals {
            Some(params) => match params.validate() {
                Ok(()) => Some(params),
                Err(error) => {
                    rejected.push(Rejection {
                        indicator: SIGNALS_LABEL.to_string(),
                        error,
                    });
                    None
                }
            },
            None => None,
        };

        Self {
            plan,
            signals,
            rejected,
        }
    }

    /// Indicators that passed validation, in output order.
    pub fn plan(&self) -> &[IndicatorType] {
        &self.plan
    }

    pub fn signal_params(&self) -> Option<&SignalParams> {
        self.signals.as_ref()
    }

    pub fn rejected(&self) -> &[Rejection] {
        &self.rejected
    }

    /// Build each security's series and compute its table. Output order
    /// follows `inputs`.
    pub fn run(&self, inputs: Vec<SecurityInput>) -> RunReport {
        #[cfg(feature = "parallel")]
        let outcomes: Vec<(Option<IndicatorTable>, Vec<Failure>)> =
            inputs.into_par_iter().map(|input| self.process(input)).collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(Option<IndicatorTable>, Vec<Failure>)> =
            inputs.into_iter().map(|input| self.process(input)).collect();

        let mut report = RunReport::default();
        for (table, failures) in outcomes {
            report.tables.extend(table);
            report.failures.extend(failures);
        }
        report
    }

    fn process(&self, input: SecurityInput) -> (Option<IndicatorTable>, Vec<Failure>) {
        match PriceSeries::new(input.security.as_str(), input.points) {
            Ok(series) => {
                let (table, failures) = self.compute(&series);
                (Some(table), failures)
            }
            Err(error) => (None, vec![Failure::from_error(&input.security, None, &error)]),
        }
    }

    /// Compute every planned indicator for one series.
    pub fn compute(&self, series: &PriceSeries) -> (IndicatorTable, Vec<Failure>) {
        let security = series.security();
        let mut table = IndicatorTable::new(series);
        let mut failures: Vec<Failure> = self
            .rejected
            .iter()
            .map(|r| Failure::from_error(security, Some(r.indicator.as_str()), &r.error))
            .collect();

        let closes = series.closes();
        let mut outputs = Outputs::default();

        for indicator in &self.plan {
            match compute_one(indicator, series, &closes, &mut outputs) {
                Ok(columns) => columns.into_iter().for_each(|c| table.push_column(c)),
                Err(error) => failures.push(Failure::from_error(
                    security,
                    Some(indicator.to_string().as_str()),
                    &error,
                )),
            }
        }

        if let Some(params) = &self.signals {
            add_signals(&mut table, params, &closes, &outputs);
        }

        (table, failures)
    }
}

/// Multi-line results kept for the decision pass.
#[derive(Default)]
struct Outputs {
    bollinger: Option<BollingerBands>,
    macd: Option<Macd>,
    rsi: Option<IndicatorSeries>,
    stochastic: Option<Stochastic>,
}

fn compute_one(
    indicator: &IndicatorType,
    series: &PriceSeries,
    closes: &IndicatorSeries,
    outputs: &mut Outputs,
) -> Result<Vec<IndicatorSeries>, IndicatorError> {
    match *indicator {
        IndicatorType::Sma(period) => Ok(vec![simple_moving_average(closes, period)?]),
        IndicatorType::Ema(period) => Ok(vec![exponential_moving_average(closes, period)?]),
        IndicatorType::Bollinger {
            period,
            num_std_dev,
        } => {
            let bands = bollinger_bands(closes, period, num_std_dev)?;
            let columns = vec![bands.upper.clone(), bands.middle.clone(), bands.lower.clone()];
            outputs.bollinger = Some(bands);
            Ok(columns)
        }
        IndicatorType::Macd { fast, slow, signal } => {
            let result = macd(closes, fast, slow, signal)?;
            let columns = vec![
                result.line.clone(),
                result.signal.clone(),
                result.histogram.clone(),
            ];
            outputs.macd = Some(result);
            Ok(columns)
        }
        IndicatorType::Rsi(period) => {
            let result = rsi(series, period)?;
            outputs.rsi = Some(result.clone());
            Ok(vec![result])
        }
        IndicatorType::Stochastic { k_period, d_period } => {
            let result = stochastic(series, k_period, d_period)?;
            let columns = vec![result.k.clone(), result.d.clone()];
            outputs.stochastic = Some(result);
            Ok(columns)
        }
    }
}

/// One decision per computed indicator. The moving-average crossover reads
/// the SMA columns already in the table, so it is only emitted when both of
/// its periods were requested as SMAs.
fn add_signals(
    table: &mut IndicatorTable,
    params: &SignalParams,
    closes: &IndicatorSeries,
    outputs: &Outputs,
) {
    let cross = match (
        table.get(&format!("SMA({})", params.ma_fast)),
        table.get(&format!("SMA({})", params.ma_slow)),
    ) {
        (Some(fast), Some(slow)) => Some(signal::crossover_signal(fast, slow, params.ma_cross_name())),
        _ => None,
    };
    if let Some(cross) = cross {
        table.push_signal(cross);
    }

    if let Some(bands) = &outputs.bollinger {
        table.push_signal(signal::bollinger_signal(closes, bands));
    }
    if let Some(result) = &outputs.macd {
        table.push_signal(signal::macd_signal(result));
    }
    if let Some(result) = &outputs.rsi {
        table.push_signal(signal::rsi_signal(
            result,
            params.rsi_oversold,
            params.rsi_overbought,
        ));
    }
    if let Some(result) = &outputs.stochastic {
        table.push_signal(signal::stochastic_signal(
            result,
            params.stochastic_oversold,
            params.stochastic_overbought,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator_config::{MacdParams, StochasticParams};
    use chrono::NaiveDate;

    fn points(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 100,
            })
            .collect()
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + ((i * 7) % 11) as f64).collect()
    }

    fn input(security: &str, closes: &[f64]) -> SecurityInput {
        SecurityInput {
            security: security.to_string(),
            points: points(closes),
        }
    }

    #[test]
    fn default_config_produces_all_columns() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        assert!(engine.rejected().is_empty());

        let series = PriceSeries::new("SNTS", points(&wave(60))).unwrap();
        let (table, failures) = engine.compute(&series);

        assert!(failures.is_empty());
        assert_eq!(
            table.column_names(),
            vec![
                "SMA(5)",
                "SMA(10)",
                "SMA(20)",
                "SMA(50)",
                "BB_UPPER(20,2)",
                "BB_MIDDLE(20,2)",
                "BB_LOWER(20,2)",
                "MACD(12,26,9)",
                "MACD_SIGNAL(12,26,9)",
                "MACD_HIST(12,26,9)",
                "RSI(14)",
                "STOCH_K(14,3)",
                "STOCH_D(14,3)",
            ]
        );
        assert_eq!(
            table.signal_names(),
            vec![
                "MA_CROSS(5,20)",
                "BB_DECISION(20,2)",
                "MACD_DECISION(12,26,9)",
                "RSI_DECISION(14)",
                "STOCH_DECISION(14,3)",
            ]
        );
        for column in table.columns() {
            assert_eq!(column.len(), 60, "{} misaligned", column.name());
        }
    }

    #[test]
    fn rejected_indicator_is_reported_per_security_and_others_still_run() {
        let config = IndicatorConfig {
            rsi: Some(0),
            macd: Some(MacdParams {
                fast: 26,
                slow: 12,
                signal: 9,
            }),
            ..IndicatorConfig::default()
        };
        let engine = IndicatorEngine::new(&config);
        let names: Vec<&str> = engine.rejected().iter().map(|r| r.indicator.as_str()).collect();
        assert_eq!(names, vec!["MACD(26,12,9)", "RSI(0)"]);

        let report = engine.run(vec![input("SNTS", &wave(40)), input("ORAC", &wave(30))]);

        assert_eq!(report.tables.len(), 2);
        assert_eq!(report.failures.len(), 4);
        assert!(report
            .failures
            .iter()
            .all(|f| f.kind == FailureKind::InvalidParameter));
        assert_eq!(report.failures[0].security, "SNTS");
        assert_eq!(report.failures[0].indicator.as_deref(), Some("MACD(26,12,9)"));
        assert_eq!(report.failures[3].security, "ORAC");
        assert_eq!(report.failures[3].indicator.as_deref(), Some("RSI(0)"));

        let table = &report.tables[0];
        assert!(table.get("SMA(5)").is_some());
        assert!(table.get("RSI(0)").is_none());
        assert!(table.signal("RSI_DECISION(0)").is_none());
        assert!(table.signal("MA_CROSS(5,20)").is_some());
    }

    #[test]
    fn negative_period_is_rejected_once_per_security() {
        let config = IndicatorConfig {
            rsi: Some(-3),
            ..IndicatorConfig::default()
        };
        let engine = IndicatorEngine::new(&config);
        assert_eq!(engine.rejected().len(), 1);
        assert_eq!(engine.rejected()[0].indicator, "RSI(-3)");
        assert!(!engine.plan().iter().any(|t| matches!(t, IndicatorType::Rsi(_))));

        let report = engine.run(vec![input("SNTS", &wave(40)), input("ORAC", &wave(30))]);

        assert_eq!(report.tables.len(), 2);
        let attributed: Vec<(&str, Option<&str>, FailureKind)> = report
            .failures
            .iter()
            .map(|f| (f.security.as_str(), f.indicator.as_deref(), f.kind))
            .collect();
        assert_eq!(
            attributed,
            vec![
                ("SNTS", Some("RSI(-3)"), FailureKind::InvalidParameter),
                ("ORAC", Some("RSI(-3)"), FailureKind::InvalidParameter),
            ]
        );
        assert_eq!(
            report.failures[0].message,
            "invalid parameter for RSI(-3): period must be at least 1, got -3"
        );
        for table in &report.tables {
            assert!(table.get("SMA(5)").is_some());
            assert!(table.get("MACD(12,26,9)").is_some());
            assert!(table.get("STOCH_K(14,3)").is_some());
            assert!(table.signal("RSI_DECISION(-3)").is_none());
        }
    }

    #[test]
    fn ma_cross_is_only_emitted_when_both_smas_are_computed() {
        let rsi_only = IndicatorConfig {
            sma: Vec::new(),
            bollinger: None,
            macd: None,
            stochastic: None,
            ..IndicatorConfig::default()
        };
        let series = PriceSeries::new("SNTS", points(&wave(30))).unwrap();
        let (table, failures) = IndicatorEngine::new(&rsi_only).compute(&series);
        assert!(failures.is_empty());
        assert_eq!(table.signal_names(), vec!["RSI_DECISION(14)"]);

        let fast_only = IndicatorConfig {
            sma: vec![5],
            ..rsi_only
        };
        let (table, _) = IndicatorEngine::new(&fast_only).compute(&series);
        assert_eq!(table.column_names(), vec!["SMA(5)", "RSI(14)"]);
        assert_eq!(table.signal_names(), vec!["RSI_DECISION(14)"]);
    }

    #[test]
    fn malformed_security_does_not_stop_others() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let mut bad = points(&wave(10));
        bad.swap(3, 4);
        let report = engine.run(vec![
            SecurityInput {
                security: "BAD".into(),
                points: bad,
            },
            input("GOOD", &wave(10)),
        ]);

        assert_eq!(report.tables.len(), 1);
        assert_eq!(report.tables[0].security(), "GOOD");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].security, "BAD");
        assert_eq!(report.failures[0].indicator, None);
        assert_eq!(report.failures[0].kind, FailureKind::MalformedInput);
    }

    #[test]
    fn invalid_signal_params_are_rejected() {
        let config = IndicatorConfig {
            signals: Some(SignalParams {
                ma_fast: 20,
                ma_slow: 20,
                ..SignalParams::default()
            }),
            ..IndicatorConfig::default()
        };
        let engine = IndicatorEngine::new(&config);
        assert_eq!(engine.rejected().len(), 1);
        assert_eq!(engine.rejected()[0].indicator, SIGNALS_LABEL);
        assert!(engine.signal_params().is_none());

        let series = PriceSeries::new("SNTS", points(&wave(30))).unwrap();
        let (table, failures) = engine.compute(&series);
        assert!(table.signals().is_empty());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].indicator.as_deref(), Some(SIGNALS_LABEL));
    }

    #[test]
    fn short_history_yields_absent_values_not_failures() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let series = PriceSeries::new("NEW", points(&[100.0, 101.0, 102.0])).unwrap();
        let (table, failures) = engine.compute(&series);

        assert!(failures.is_empty());
        assert_eq!(table.get("SMA(50)").unwrap().defined_count(), 0);
        assert_eq!(table.get("MACD(12,26,9)").unwrap().defined_count(), 0);
        assert_eq!(table.get("SMA(5)").unwrap().len(), 3);
    }

    #[test]
    fn signals_disabled_emit_no_decisions() {
        let config = IndicatorConfig {
            signals: None,
            stochastic: Some(StochasticParams {
                k_period: 5,
                d_period: 2,
            }),
            ..IndicatorConfig::default()
        };
        let engine = IndicatorEngine::new(&config);
        let series = PriceSeries::new("SNTS", points(&wave(20))).unwrap();
        let (table, _) = engine.compute(&series);

        assert!(table.signals().is_empty());
        assert!(table.get("STOCH_K(5,2)").is_some());
    }

    #[test]
    fn run_is_deterministic() {
        let engine = IndicatorEngine::new(&IndicatorConfig::default());
        let inputs = vec![input("A", &wave(80)), input("B", &wave(45))];

        let first = engine.run(inputs.clone());
        let second = engine.run(inputs);
        assert_eq!(first, second);
    }

    #[test]
    fn failure_display() {
        let failure = Failure::data_source("SNTS", "file unreadable");
        assert_eq!(failure.to_string(), "SNTS: file unreadable");
        assert_eq!(failure.kind.to_string(), "data_source");
    }
}
