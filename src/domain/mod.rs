//! Core domain types and calculations.

pub mod engine;
pub mod error;
pub mod indicator;
pub mod indicator_config;
pub mod price_series;
pub mod signal;
pub mod table;
