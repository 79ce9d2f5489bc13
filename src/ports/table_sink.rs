//! Output collaborator port: receives one table per security and the
//! failure report of the run.

use crate::domain::engine::Failure;
use crate::domain::error::TaError;
use crate::domain::table::IndicatorTable;

pub trait TableSink {
    fn write_table(&self, table: &IndicatorTable) -> Result<(), TaError>;

    fn write_failures(&self, failures: &[Failure]) -> Result<(), TaError>;

    /// Default implementation: writes tables in order, stopping at the first error.
    fn write_all(&self, tables: &[IndicatorTable], failures: &[Failure]) -> Result<(), TaError> {
        for table in tables {
            self.write_table(table)?;
        }
        self.write_failures(failures)
    }
}
