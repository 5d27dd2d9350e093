use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElsBacktestError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Structure mismatch: {early_levels} early redemption levels but {observations} scheduled observations")]
    StructureMismatch {
        early_levels: usize,
        observations: usize,
    },

    #[error("No valid cases: {0}")]
    NoValidCases(String),

    #[error("Date out of range: {date} is beyond the last available trading date {last_available}")]
    DateOutOfRange {
        date: NaiveDate,
        last_available: NaiveDate,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ElsBacktestError {
    fn from(e: serde_json::Error) -> Self {
        ElsBacktestError::SerializationError(e.to_string())
    }
}
