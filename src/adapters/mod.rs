//! Concrete adapter implementations for ports.

pub mod csv_price_source;
pub mod csv_table_sink;
pub mod file_config_adapter;
