use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {0} failed")]
    DownloadIo(String, #[source] std::io::Error),

    #[error("Failed to create temporary file for download")]
    TempFile(#[source] std::io::Error),

    #[cfg(feature = "netcdf")]
    #[error("Downloaded file from {url} could not be opened")]
    Unreadable {
        url: String,
        #[source]
        source: crate::dataset::error::DatasetError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Raised by a custom [`crate::DataFetcher`]; passed through as-is.
    #[error(transparent)]
    External(Box<dyn std::error::Error + Send + Sync>),
}
