//! Per-security result table.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::SignalSeries;
use chrono::NaiveDate;

/// Named indicator and signal columns sharing the date axis of one
/// `PriceSeries`. Columns keep the order they were added in.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    security: String,
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
    columns: Vec<IndicatorSeries>,
    signals: Vec<SignalSeries>,
}

impl IndicatorTable {
    pub fn new(series: &PriceSeries) -> Self {
        Self {
            security: series.security().to_string(),
            dates: series.dates(),
            closes: series.points().iter().map(|p| p.close).collect(),
            columns: Vec::new(),
            signals: Vec::new(),
        }
    }

    pub fn security(&self) -> &str {
        &self.security
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn columns(&self) -> &[IndicatorSeries] {
        &self.columns
    }

    pub fn signals(&self) -> &[SignalSeries] {
        &self.signals
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorSeries> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn signal(&self, name: &str) -> Option<&SignalSeries> {
        self.signals.iter().find(|s| s.name() == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn signal_names(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.name()).collect()
    }

    pub(crate) fn push_column(&mut self, column: IndicatorSeries) {
        debug_assert_eq!(column.dates(), self.dates, "column {} misaligned", column.name());
        self.columns.push(column);
    }

    pub(crate) fn push_signal(&mut self, signal: SignalSeries) {
        debug_assert_eq!(signal.len(), self.dates.len(), "signal {} misaligned", signal.name());
        self.signals.push(signal);
    }
}
