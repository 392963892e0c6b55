use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dimension '{0}' not found in file")]
    DimensionNotFound(String),

    /// Carries the dimension's name when the caller knows it.
    #[error(
        "Time dimension{} has no 'units' attribute",
        .0.as_ref().map(|name| format!(" '{}'", name)).unwrap_or_default()
    )]
    MissingUnits(Option<String>),

    #[error("Units '{0}' do not match '<unit> since <YYYY-MM-DD>'")]
    MalformedUnits(String),

    #[error("Unknown time unit '{unit}' in '{units}'")]
    UnknownTimeUnit { unit: String, units: String },

    #[error("Invalid reference date '{date}' in '{units}'")]
    InvalidReferenceDate { date: String, units: String },

    #[error("Time offset {offset} at index {index} is not finite")]
    NonFiniteOffset { index: usize, offset: f64 },

    #[error("Time offset {offset} {unit} at index {index} leaves the representable date range")]
    OffsetOutOfRange {
        index: usize,
        offset: f64,
        unit: String,
    },

    #[error("Column '{column}' has {found} values but the date column has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed to open array file '{0}': {1}")]
    Open(PathBuf, String),

    #[error("Failed to read variable '{name}': {message}")]
    VariableRead { name: String, message: String },
}

impl DatasetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::DimensionNotFound(_))
    }

    pub fn is_alignment(&self) -> bool {
        matches!(self, DatasetError::LengthMismatch { .. })
    }

    /// Errors caused by an unusable time encoding.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            DatasetError::MissingUnits(_)
                | DatasetError::MalformedUnits(_)
                | DatasetError::UnknownTimeUnit { .. }
                | DatasetError::InvalidReferenceDate { .. }
                | DatasetError::NonFiniteOffset { .. }
                | DatasetError::OffsetOutOfRange { .. }
        )
    }
}
