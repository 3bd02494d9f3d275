//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for multipass.
#[derive(Debug, thiserror::Error)]
pub enum MultipassError {
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

    #[error("no data for {asset}")]
    NoData { asset: String },

    #[error("no assets with data between {start} and {end}")]
    EmptyUniverse { start: NaiveDate, end: NaiveDate },

    #[error("forward-looking read: requested {requested} while evaluating {as_of}")]
    ForwardLooking {
        requested: NaiveDate,
        as_of: NaiveDate,
    },

    #[error(
        "look-ahead detected on {date} for {asset}: multi-pass weight {multi_pass}, single-pass weight {single_pass}"
    )]
    LookAheadDetected {
        date: NaiveDate,
        asset: String,
        multi_pass: f64,
        single_pass: f64,
    },

    #[error("strategy returned {actual} weights for {expected} assets")]
    WeightShape { expected: usize, actual: usize },

    #[error("strategy {strategy} does not support single-pass evaluation")]
    UnsupportedMode { strategy: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MultipassError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        MultipassError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&MultipassError> for std::process::ExitCode {
    fn from(err: &MultipassError) -> Self {
        let code: u8 = match err {
            MultipassError::Io(_) => 1,
            MultipassError::ConfigParse { .. }
            | MultipassError::ConfigMissing { .. }
            | MultipassError::ConfigInvalid { .. } => 2,
            MultipassError::Data { .. }
            | MultipassError::NoData { .. }
            | MultipassError::EmptyUniverse { .. }
            | MultipassError::Csv(_) => 3,
            MultipassError::ForwardLooking { .. } | MultipassError::LookAheadDetected { .. } => 4,
            MultipassError::WeightShape { .. } | MultipassError::UnsupportedMode { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
