//! CSV file price source: one `<SECURITY>.csv` per security.
//!
//! The schema is strict. Headers are matched case-insensitively; `date`,
//! `close` and `volume` are required; `open`, `high` and `low` come as a set
//! or not at all (close-only sheets get them filled from the close).
//! Numbers may use a comma as decimal separator and spaces as thousands
//! separators, which is how the exchange publishes them.

use crate::domain::error::{IndicatorError, TaError};
use crate::domain::price_series::PricePoint;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_source::PriceSource;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_EXCLUDE: [&str; 1] = ["UNMATCHED"];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

pub struct CsvPriceSource {
    input_dir: PathBuf,
    exclude: Vec<String>,
}

impl CsvPriceSource {
    pub fn new(input_dir: impl Into<PathBuf>, exclude: Vec<String>) -> Self {
        Self {
            input_dir: input_dir.into(),
            exclude,
        }
    }

    /// Reads `[data] input_dir` (required) and `[data] exclude`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TaError> {
        let input_dir = config
            .get_string("data", "input_dir")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TaError::ConfigMissing {
                section: "data".into(),
                key: "input_dir".into(),
            })?;
        let exclude = config
            .get_list("data", "exclude")
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());
        Ok(Self::new(input_dir.trim(), exclude))
    }

    fn csv_path(&self, security: &str) -> PathBuf {
        self.input_dir.join(format!("{}.csv", security))
    }

    fn is_excluded(&self, security: &str) -> bool {
        self.exclude.iter().any(|e| e.eq_ignore_ascii_case(security))
    }
}

impl PriceSource for CsvPriceSource {
    fn list_securities(&self) -> Result<Vec<String>, TaError> {
        let entries = fs::read_dir(&self.input_dir).map_err(|e| TaError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.input_dir.display(),
                e
            ),
        })?;

        let mut securities = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TaError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if self.is_excluded(stem) {
                    debug!(security = stem, "excluded by configuration");
                    continue;
                }
                securities.push(stem.to_string());
            }
        }

        securities.sort();
        Ok(securities)
    }

    fn fetch_prices(&self, security: &str) -> Result<Vec<PricePoint>, TaError> {
        let path = self.csv_path(security);
        let content = fs::read_to_string(&path).map_err(|e| TaError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let points = parse_prices(security, &content)?;
        debug!(security, rows = points.len(), path = %path.display(), "price file loaded");
        Ok(points)
    }
}

#[derive(Debug, Clone, Copy)]
struct Schema {
    date: usize,
    close: usize,
    volume: usize,
    ohl: Option<[usize; 3]>,
}

fn malformed(security: &str, reason: impl Into<String>) -> TaError {
    TaError::Indicator(IndicatorError::malformed(security, reason))
}

/// Semicolon-separated sheets are common where the comma is the decimal mark.
fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

fn parse_schema(security: &str, headers: &csv::StringRecord) -> Result<Schema, TaError> {
    let mut slots: [Option<usize>; 6] = [None; 6];
    const NAMES: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

    for (index, raw) in headers.iter().enumerate() {
        let name = raw.trim().to_lowercase();
        let Some(slot) = NAMES.iter().position(|n| *n == name) else {
            return Err(malformed(security, format!("unknown column '{}'", raw.trim())));
        };
        if slots[slot].is_some() {
            return Err(malformed(security, format!("duplicate column '{}'", name)));
        }
        slots[slot] = Some(index);
    }

    let required = |slot: usize| {
        slots[slot].ok_or_else(|| malformed(security, format!("missing column '{}'", NAMES[slot])))
    };
    let date = required(0)?;
    let close = required(4)?;
    let volume = required(5)?;

    let ohl = match (slots[1], slots[2], slots[3]) {
        (Some(open), Some(high), Some(low)) => Some([open, high, low]),
        (None, None, None) => None,
        _ => {
            return Err(malformed(
                security,
                "columns open, high and low must be given together",
            ));
        }
    };

    Ok(Schema {
        date,
        close,
        volume,
        ohl,
    })
}

fn parse_prices(security: &str, content: &str) -> Result<Vec<PricePoint>, TaError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| malformed(security, format!("unreadable header: {}", e)))?
        .clone();
    let schema = parse_schema(security, &headers)?;

    let mut points = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let row = index + 1;
        let record = result.map_err(|e| malformed(security, format!("row {}: {}", row, e)))?;
        let field = |column: usize| record.get(column).unwrap_or_default();
        let number = |column: usize| {
            let raw = field(column);
            parse_number(raw).ok_or_else(|| {
                malformed(
                    security,
                    format!("row {}, column '{}': invalid number '{}'", row, &headers[column], raw),
                )
            })
        };

        let raw_date = field(schema.date);
        let date = parse_date(raw_date).ok_or_else(|| {
            malformed(security, format!("row {}: invalid date '{}'", row, raw_date))
        })?;
        let close = number(schema.close)?;
        let raw_volume = field(schema.volume);
        let volume = parse_volume(raw_volume).ok_or_else(|| {
            malformed(security, format!("row {}: invalid volume '{}'", row, raw_volume))
        })?;

        let point = match schema.ohl {
            Some([open, high, low]) => PricePoint {
                date,
                open: number(open)?,
                high: number(high)?,
                low: number(low)?,
                close,
                volume,
            },
            None => PricePoint::close_only(date, close, volume),
        };
        points.push(point);
    }

    Ok(points)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn strip_grouping(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect()
}

/// Locale-tolerant decimal: `1 234,50` and `1234.5` are accepted, `1,234.5`
/// is not.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = strip_grouping(raw);
    if cleaned.is_empty() || (cleaned.contains('.') && cleaned.contains(',')) {
        return None;
    }
    let normalized = cleaned.replace(',', ".");
    let (sign, digits) = match normalized.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, normalized.as_str()),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .map(|v| sign * v)
        .filter(|v| v.is_finite())
}

fn parse_volume(raw: &str) -> Option<u64> {
    let cleaned = strip_grouping(raw);
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let ohlc = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";
        fs::write(path.join("SNTS.csv"), ohlc).unwrap();
        fs::write(
            path.join("ORAC.csv"),
            "Date;Close;Volume\n15/01/2024;\"14 500,50\";1 200\n16/01/2024;14600;900\n",
        )
        .unwrap();
        fs::write(path.join("UNMATCHED.csv"), "date,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not a price file").unwrap();

        (dir, path)
    }

    fn source(path: PathBuf) -> CsvPriceSource {
        CsvPriceSource::new(path, vec!["UNMATCHED".into()])
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_prices_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let points = source(path).fetch_prices("SNTS").unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, day(15));
        assert_eq!(points[0].open, 100.0);
        assert_eq!(points[0].high, 110.0);
        assert_eq!(points[0].low, 90.0);
        assert_eq!(points[0].close, 105.0);
        assert_eq!(points[0].volume, 50000);
    }

    #[test]
    fn close_only_sheet_with_local_formatting() {
        let (_dir, path) = setup_test_data();
        let points = source(path).fetch_prices("ORAC").unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, day(15));
        assert_eq!(points[0].close, 14500.5);
        assert_eq!(points[0].open, 14500.5);
        assert_eq!(points[0].high, 14500.5);
        assert_eq!(points[0].low, 14500.5);
        assert_eq!(points[0].volume, 1200);
    }

    #[test]
    fn list_securities_skips_excluded_and_other_files() {
        let (_dir, path) = setup_test_data();
        assert_eq!(source(path).list_securities().unwrap(), vec!["ORAC", "SNTS"]);
    }

    #[test]
    fn missing_file_is_data_source_error() {
        let (_dir, path) = setup_test_data();
        let result = source(path).fetch_prices("XYZ");
        assert!(matches!(result, Err(TaError::DataSource { .. })));
    }

    #[test]
    fn missing_directory_is_data_source_error() {
        let result = source(PathBuf::from("/nonexistent/prices")).list_securities();
        assert!(matches!(result, Err(TaError::DataSource { .. })));
    }

    #[test]
    fn data_range_reports_span() {
        let (_dir, path) = setup_test_data();
        let range = source(path).data_range("SNTS").unwrap();
        assert_eq!(range, Some((day(15), day(17), 3)));
    }

    #[test]
    fn empty_file_has_no_rows() {
        assert!(parse_prices("SNTS", "").unwrap().is_empty());
        assert!(parse_prices("SNTS", "\n  \n").unwrap().is_empty());
        assert!(parse_prices("SNTS", "date,close,volume\n").unwrap().is_empty());
    }

    #[test]
    fn rows_keep_file_order() {
        let content = "date,close,volume\n2024-01-17,3,1\n2024-01-15,1,1\n";
        let points = parse_prices("X", content).unwrap();
        assert_eq!(points[0].date, day(17));
        assert_eq!(points[1].date, day(15));
    }

    fn assert_malformed(content: &str, needle: &str) {
        match parse_prices("SNTS", content) {
            Err(TaError::Indicator(IndicatorError::MalformedInput { security, reason })) => {
                assert_eq!(security, "SNTS");
                assert!(reason.contains(needle), "'{}' not in '{}'", needle, reason);
            }
            other => panic!("expected malformed input, got {:?}", other),
        }
    }

    #[test]
    fn schema_violations_are_malformed_input() {
        assert_malformed("date,close\n2024-01-15,1\n", "missing column 'volume'");
        assert_malformed("date,close,volume,vwap\n", "unknown column 'vwap'");
        assert_malformed("date,close,Close,volume\n", "duplicate column 'close'");
        assert_malformed("date,open,close,volume\n", "open, high and low");
    }

    #[test]
    fn field_violations_name_the_row() {
        assert_malformed("date,close,volume\n2024-01-15,1,1\n15.01.2024,1,1\n", "row 2: invalid date");
        assert_malformed("date,close,volume\n2024-01-15,$12,1\n", "row 1, column 'close'");
        assert_malformed("date,close,volume\n2024-01-15,12,1.5\n", "invalid volume");
        assert_malformed("date,close,volume\n2024-01-15,12\n", "row 1");
    }

    #[test]
    fn parse_number_accepts_local_formats() {
        assert_eq!(parse_number("1234.5"), Some(1234.5));
        assert_eq!(parse_number("1234,5"), Some(1234.5));
        assert_eq!(parse_number("1 234,5"), Some(1234.5));
        assert_eq!(parse_number("1\u{a0}234"), Some(1234.0));
        assert_eq!(parse_number("-2,5"), Some(-2.5));
    }

    #[test]
    fn parse_number_rejects_ambiguous_or_foreign_input() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("1,234.5"), None);
        assert_eq!(parse_number("12 FCFA"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("1e3"), None);
        assert_eq!(parse_number("1.2.3"), None);
    }

    #[test]
    fn from_config_requires_input_dir() {
        let config = FileConfigAdapter::from_string("[data]\n").unwrap();
        let result = CsvPriceSource::from_config(&config);
        assert!(matches!(result, Err(TaError::ConfigMissing { .. })));
    }

    #[test]
    fn from_config_defaults_exclude_list() {
        let (_dir, path) = setup_test_data();
        let ini = format!("[data]\ninput_dir = {}\n", path.display());
        let config = FileConfigAdapter::from_string(&ini).unwrap();
        let source = CsvPriceSource::from_config(&config).unwrap();
        assert_eq!(source.list_securities().unwrap(), vec!["ORAC", "SNTS"]);
    }
}
