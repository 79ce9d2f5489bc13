//! Daily price bars and the per-security series every indicator consumes.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries};
use chrono::NaiveDate;

/// One dated price observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PricePoint {
    /// Bar for feeds that publish a single price per day.
    pub fn close_only(date: NaiveDate, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    fn check(&self) -> Result<(), String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} is not a finite number"));
        }
        if self.low > self.high {
            return Err(format!("low {} above high {}", self.low, self.high));
        }
        if self.open < self.low || self.open > self.high {
            return Err(format!(
                "open {} outside [{}, {}]",
                self.open, self.low, self.high
            ));
        }
        if self.close < self.low || self.close > self.high {
            return Err(format!(
                "close {} outside [{}, {}]",
                self.close, self.low, self.high
            ));
        }
        Ok(())
    }
}

/// Ordered price history for one security.
///
/// Dates are strictly increasing. The series is never patched after
/// construction; a new run builds a new series.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    security: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(security: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, IndicatorError> {
        let security = security.into();

        for (row, point) in points.iter().enumerate() {
            point.check().map_err(|reason| {
                IndicatorError::malformed(&security, format!("bar {} ({}): {}", row, point.date, reason))
            })?;
        }

        if let Some(row) = points.windows(2).position(|w| w[1].date <= w[0].date) {
            let (prev, next) = (points[row].date, points[row + 1].date);
            let reason = if prev == next {
                format!("duplicate date {} at bar {}", next, row + 1)
            } else {
                format!("date {} at bar {} does not follow {}", next, row + 1, prev)
            };
            return Err(IndicatorError::malformed(&security, reason));
        }

        Ok(Self { security, points })
    }

    pub fn security(&self) -> &str {
        &self.security
    }

    pub fn points(&self) -> &[PricePoint] {
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

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Closing prices as a fully defined indicator series named `CLOSE`.
    pub fn closes(&self) -> IndicatorSeries {
        IndicatorSeries::new(
            "CLOSE",
            self.points
                .iter()
                .map(|p| IndicatorPoint::defined(p.date, p.close))
                .collect(),
        )
    }
}
