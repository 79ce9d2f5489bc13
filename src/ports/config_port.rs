//! Configuration access port trait.
//!
//! Implementors only supply raw strings; the typed getters are strict:
//! a missing key yields the default, a present but unparsable value is a
//! `ConfigInvalid` error rather than a silent fallback.

use crate::domain::error::TaError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Comma-separated list. An empty value is an empty list.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    fn get_usize(&self, section: &str, key: &str, default: usize) -> Result<usize, TaError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                TaError::config_invalid(
                    section,
                    key,
                    format!("expected a non-negative integer, got '{}'", raw.trim()),
                )
            }),
        }
    }

    /// Signed so that a negative value can be carried to where it is judged.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TaError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                TaError::config_invalid(
                    section,
                    key,
                    format!("expected an integer, got '{}'", raw.trim()),
                )
            }),
        }
    }

    fn get_f64(&self, section: &str, key: &str, default: f64) -> Result<f64, TaError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    TaError::config_invalid(
                        section,
                        key,
                        format!("expected a number, got '{}'", raw.trim()),
                    )
                }),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TaError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                other => Err(TaError::config_invalid(
                    section,
                    key,
                    format!("expected true/false, got '{other}'"),
                )),
            },
        }
    }
}
