//! Domain error types (error taxonomy: recoverable vs fatal).

/// Top-level error type for the backtester.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BacktestError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("insufficient funds for {symbol}: need {required:.2}, have {available:.2}")]
    InsufficientFunds {
        symbol: String,
        required: f64,
        available: f64,
    },

    #[error("insufficient position in {symbol}: requested {requested}, held {held}")]
    InsufficientPosition {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("{what} must not be empty")]
    EmptyInput { what: &'static str },

    #[error("{what} needs at least {minimum} points, got {actual}")]
    InsufficientData {
        what: &'static str,
        minimum: usize,
        actual: usize,
    },

    #[error("window size {window} is invalid for a series of length {len}")]
    InvalidWindow { window: usize, len: usize },

    #[error("{metric} is undefined: zero equity value in denominator")]
    DivisionByZero { metric: &'static str },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("replay engine is {state}, expected not started")]
    EngineState { state: String },

    #[error("io error: {0}")]
    Io(String),
}

impl BacktestError {
    /// Policy-level rejections a strategy may log and skip.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BacktestError::InsufficientFunds { .. } | BacktestError::InsufficientPosition { .. }
        )
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BacktestError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for BacktestError {
    fn from(err: std::io::Error) -> Self {
        BacktestError::Io(err.to_string())
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Io(_) => 1,
            BacktestError::InvalidConfiguration { .. }
            | BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } => 3,
            BacktestError::InvalidOrder { .. }
            | BacktestError::InsufficientFunds { .. }
            | BacktestError::InsufficientPosition { .. } => 4,
            BacktestError::EmptyInput { .. }
            | BacktestError::InsufficientData { .. }
            | BacktestError::InvalidWindow { .. }
            | BacktestError::DivisionByZero { .. } => 5,
            BacktestError::EngineState { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
