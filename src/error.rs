use crate::dataset::error::DatasetError;
use crate::fetch::error::FetchError;
use crate::query::error::QueryError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IridlError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Failed building DataFrame: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Coarse classification of an [`IridlError`], used to mark failed batch entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected query parameters; nothing was sent to the service.
    Validation,
    /// A requested dimension was absent from the fetched file.
    NotFound,
    /// An unusable time encoding.
    Format,
    /// Columns of different lengths.
    Alignment,
    Fetch,
    Internal,
}

impl IridlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IridlError::Query(_) => ErrorKind::Validation,
            IridlError::Fetch(_) => ErrorKind::Fetch,
            IridlError::Dataset(e) if e.is_not_found() => ErrorKind::NotFound,
            IridlError::Dataset(e) if e.is_format() => ErrorKind::Format,
            IridlError::Dataset(e) if e.is_alignment() => ErrorKind::Alignment,
            IridlError::Dataset(_) | IridlError::DataFrame(_) | IridlError::TaskJoin(_) => {
                ErrorKind::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let validation = IridlError::from(QueryError::LatitudeOutOfRange(91.0));
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(validation.to_string(), "Latitude 91 is outside [-90, 90]");

        let missing = IridlError::from(DatasetError::DimensionNotFound("T".to_string()));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let format = IridlError::from(DatasetError::MalformedUnits("days".to_string()));
        assert_eq!(format.kind(), ErrorKind::Format);

        let alignment = IridlError::from(DatasetError::LengthMismatch {
            column: "temp".to_string(),
            expected: 5,
            found: 4,
        });
        assert_eq!(alignment.kind(), ErrorKind::Alignment);

        let fetch = IridlError::from(FetchError::External("boom".into()));
        assert_eq!(fetch.kind(), ErrorKind::Fetch);
        assert_eq!(fetch.to_string(), "boom");
    }
}
