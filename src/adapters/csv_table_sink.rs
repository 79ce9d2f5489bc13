//! CSV output: one `<SECURITY>_indicators.csv` per table plus `failures.csv`.

use crate::adapters::csv_price_source::parse_number;
use crate::domain::engine::Failure;
use crate::domain::error::TaError;
use crate::domain::table::IndicatorTable;
use crate::ports::config_port::ConfigPort;
use crate::ports::table_sink::TableSink;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_MISSING_MARKER: &str = "NA";
pub const DEFAULT_PRECISION: usize = 2;
pub const FAILURES_FILE: &str = "failures.csv";

pub struct CsvTableSink {
    output_dir: PathBuf,
    missing_marker: String,
    precision: usize,
}

impl CsvTableSink {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        missing_marker: impl Into<String>,
        precision: usize,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            missing_marker: missing_marker.into(),
            precision,
        }
    }

    /// Reads `[output] output_dir` (required), `missing_marker` and `precision`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TaError> {
        let output_dir = config
            .get_string("output", "output_dir")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TaError::ConfigMissing {
                section: "output".into(),
                key: "output_dir".into(),
            })?;
        let marker = config
            .get_string("output", "missing_marker")
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MISSING_MARKER.to_string());
        validate_marker(&marker)?;
        let precision = config.get_usize("output", "precision", DEFAULT_PRECISION)?;

        Ok(Self::new(output_dir.trim(), marker, precision))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn table_path(&self, security: &str) -> PathBuf {
        self.output_dir.join(format!("{}_indicators.csv", security))
    }

    fn format_value(&self, value: Option<f64>) -> String {
        match value {
            Some(v) => format_decimal(v, self.precision),
            None => self.missing_marker.clone(),
        }
    }

    fn writer(&self, path: &Path) -> Result<csv::Writer<fs::File>, TaError> {
        fs::create_dir_all(&self.output_dir)?;
        csv::Writer::from_path(path).map_err(|e| TaError::Io(io::Error::from(e)))
    }
}

fn validate_marker(marker: &str) -> Result<(), TaError> {
    if marker.is_empty() {
        return Err(TaError::config_invalid(
            "output",
            "missing_marker",
            "must not be empty",
        ));
    }
    let numeric = parse_number(marker).is_some()
        || marker.parse::<f64>().map(f64::is_finite).unwrap_or(false);
    if numeric {
        return Err(TaError::config_invalid(
            "output",
            "missing_marker",
            format!("'{}' reads as a number", marker),
        ));
    }
    Ok(())
}

/// Rounds for display only; `-0.00` is written as `0.00`.
fn format_decimal(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

fn csv_err(e: csv::Error) -> TaError {
    TaError::Io(io::Error::from(e))
}

impl TableSink for CsvTableSink {
    fn write_table(&self, table: &IndicatorTable) -> Result<(), TaError> {
        let path = self.table_path(table.security());
        let mut wtr = self.writer(&path)?;

        let mut header = vec!["date".to_string(), "close".to_string()];
        header.extend(table.column_names().into_iter().map(str::to_string));
        header.extend(table.signal_names().into_iter().map(str::to_string));
        wtr.write_record(&header).map_err(csv_err)?;

        for (row, date) in table.dates().iter().enumerate() {
            let mut record = Vec::with_capacity(header.len());
            record.push(date.format("%Y-%m-%d").to_string());
            record.push(format_decimal(table.closes()[row], self.precision));
            record.extend(table.columns().iter().map(|c| self.format_value(c.value_at(row))));
            record.extend(table.signals().iter().map(|s| {
                s.signal_at(row)
                    .map(|signal| signal.to_string())
                    .unwrap_or_else(|| self.missing_marker.clone())
            }));
            wtr.write_record(&record).map_err(csv_err)?;
        }
        wtr.flush()?;

        debug!(
            security = table.security(),
            rows = table.row_count(),
            path = %path.display(),
            "indicator table written"
        );
        Ok(())
    }

    fn write_failures(&self, failures: &[Failure]) -> Result<(), TaError> {
        let path = self.output_dir.join(FAILURES_FILE);
        let mut wtr = self.writer(&path)?;

        wtr.write_record(["security", "indicator", "kind", "message"])
            .map_err(csv_err)?;
        for failure in failures {
            let kind = failure.kind.to_string();
            wtr.write_record([
                failure.security.as_str(),
                failure.indicator.as_deref().unwrap_or(""),
                kind.as_str(),
                failure.message.as_str(),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;

        info!(count = failures.len(), path = %path.display(), "failure report written");
        Ok(())
    }
}
