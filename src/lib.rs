//! Query builder and point-series extractor for the IRI Data Library.
//!
//! Queries are immutable chains of tags ([`QueryState`]) checked against a
//! [`Grammar`], serialized into Data Library URLs, fetched as array files and turned
//! into date-indexed tables ([`TabularRecord`]). [`IriClient`] ties the steps together
//! and can run one pipeline per site concurrently.

mod batch;
mod client;
mod config;
pub mod dataset;
mod error;
mod fetch;
mod pipeline;
pub mod query;

pub use batch::{run_batch, BatchRequest, Site, SiteResult, DEFAULT_TIME_DIMENSION};
pub use client::IriClient;
pub use config::ClientConfig;
pub use error::{ErrorKind, IridlError};

pub use query::catalog::VariableCatalog;
pub use query::error::QueryError;
pub use query::grammar::{Grammar, OrderingRule, DEFAULT_ROOT};
pub use query::state::QueryState;
pub use query::tag::{AggregationOp, AnalysisOp, Tag, TagKind};
pub use query::url::{generate, with_data_suffix};

pub use dataset::dimension::{AttributeMap, DatasetRecord, DimensionData};
pub use dataset::error::DatasetError;
#[cfg(feature = "netcdf")]
pub use dataset::netcdf_file::NetcdfArrayFile;
pub use dataset::reader::{read, ArraySource, MemoryArrayFile};
pub use dataset::tabular::{assemble, assemble_columns, TabularRecord, TabularRow};
pub use dataset::time::{normalize, normalize_datetimes, TimeEncoding, TimeUnit};

pub use fetch::error::FetchError;
pub use fetch::fetcher::{DataFetcher, DownloadedFile, HttpFetcher};
#[cfg(feature = "netcdf")]
pub use fetch::fetcher::OpenedDownload;
