#![allow(dead_code)]

use brvmta::domain::engine::Failure;
use brvmta::domain::error::TaError;
pub use brvmta::domain::price_series::{PricePoint, PriceSeries};
use brvmta::domain::table::IndicatorTable;
use brvmta::ports::price_source::PriceSource;
use brvmta::ports::table_sink::TableSink;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_points(mut self, security: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(security.to_string(), points);
        self
    }

    pub fn with_error(mut self, security: &str, reason: &str) -> Self {
        self.errors.insert(security.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn list_securities(&self) -> Result<Vec<String>, TaError> {
        let mut securities: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        securities.sort();
        Ok(securities)
    }

    fn fetch_prices(&self, security: &str) -> Result<Vec<PricePoint>, TaError> {
        if let Some(reason) = self.errors.get(security) {
            return Err(TaError::DataSource {
                reason: reason.clone(),
            });
        }
        self.data
            .get(security)
            .cloned()
            .ok_or_else(|| TaError::DataSource {
                reason: format!("unknown security {}", security),
            })
    }
}

/// Keeps everything it is given in memory.
#[derive(Default)]
pub struct MemorySink {
    pub tables: RefCell<Vec<IndicatorTable>>,
    pub failures: RefCell<Vec<Failure>>,
}

impl TableSink for MemorySink {
    fn write_table(&self, table: &IndicatorTable) -> Result<(), TaError> {
        self.tables.borrow_mut().push(table.clone());
        Ok(())
    }

    fn write_failures(&self, failures: &[Failure]) -> Result<(), TaError> {
        self.failures.borrow_mut().extend_from_slice(failures);
        Ok(())
    }
}

pub fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + chrono::Duration::days(offset as i64)
}

/// Bars with a one-point range around each close.
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: day(i),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        })
        .collect()
}

pub fn make_series(security: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(security, make_points(closes)).unwrap()
}

/// Deterministic saw-tooth price path around `base`.
pub fn generate_closes(n: usize, base: f64) -> Vec<f64> {
    (0..n)
        .map(|i| base + ((i * 7) % 13) as f64 - 6.0 + i as f64 * 0.1)
        .collect()
}
