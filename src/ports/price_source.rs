//! Input collaborator port: raw price rows per security.

use crate::domain::error::TaError;
use crate::domain::price_series::PricePoint;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Securities available to a run, sorted.
    fn list_securities(&self) -> Result<Vec<String>, TaError>;

    /// Rows for one security, in source order. Ordering is not checked here;
    /// `PriceSeries::new` rejects non-increasing dates.
    fn fetch_prices(&self, security: &str) -> Result<Vec<PricePoint>, TaError>;

    /// First date, last date and bar count, or `None` for an empty history.
    fn data_range(&self, security: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, TaError> {
        let points = self.fetch_prices(security)?;
        Ok(match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, points.len())),
            _ => None,
        })
    }
}
