//! Domain and application error types.

/// Failure raised by the computation core.
///
/// Cheap to clone so the engine can attribute the same rejection to every
/// security in a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("invalid parameter for {indicator}: {reason}")]
    InvalidParameter { indicator: String, reason: String },

    #[error("malformed input for {security}: {reason}")]
    MalformedInput { security: String, reason: String },
}

impl IndicatorError {
    pub fn invalid(indicator: impl Into<String>, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            indicator: indicator.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(security: impl Into<String>, reason: impl Into<String>) -> Self {
        IndicatorError::MalformedInput {
            security: security.into(),
            reason: reason.into(),
        }
    }

    /// The indicator or security the error is attributed to.
    pub fn subject(&self) -> &str {
        match self {
            IndicatorError::InvalidParameter { indicator, .. } => indicator,
            IndicatorError::MalformedInput { security, .. } => security,
        }
    }
}

/// Top-level error type for brvmta.
#[derive(Debug, thiserror::Error)]
pub enum TaError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no price data for {security}")]
    NoData { security: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TaError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TaError> for std::process::ExitCode {
    fn from(err: &TaError) -> Self {
        let code: u8 = match err {
            TaError::Io(_) => 1,
            TaError::ConfigParse { .. }
            | TaError::ConfigMissing { .. }
            | TaError::ConfigInvalid { .. } => 2,
            TaError::DataSource { .. } => 3,
            TaError::Indicator(_) => 4,
            TaError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
