//! brvmta: technical-analysis indicators over daily price series.
//!
//! Hexagonal architecture: the pure computation engine lives in [`domain`],
//! port traits in [`ports`], CSV and INI implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
