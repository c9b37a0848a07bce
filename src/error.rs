//! Error types shared across the crate.

use thiserror::Error;

/// Failures while turning raw input into a [`Dataset`](crate::data::model::Dataset).
#[derive(Error, Debug)]
pub enum DataError {
    #[error("row {row} is not a JSON object")]
    RowNotObject { row: usize },

    #[error("expected a top-level JSON array of records")]
    NotAnArray,

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

/// Failures inside a single analyzer for a single feature. These are logged
/// and the feature is dropped; they never fail a request.
#[derive(Error, Debug, PartialEq)]
pub enum AnalysisError {
    #[error("no values to analyse")]
    Empty,

    #[error("column has {0} missing values")]
    MissingValues(usize),

    #[error("non-finite result while computing {0}")]
    NonFinite(&'static str),
}

/// Invalid service configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
