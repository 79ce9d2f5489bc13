//! Port traits the CLI wires to concrete adapters.

pub mod config_port;
pub mod price_source;
pub mod table_sink;
