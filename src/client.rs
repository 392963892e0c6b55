//! The main entry point: builds queries against one grammar and turns them into tables.

use crate::batch::{run_batch, BatchRequest, Site, SiteResult, DEFAULT_TIME_DIMENSION};
use crate::config::ClientConfig;
use crate::dataset::dimension::DatasetRecord;
use crate::dataset::tabular::TabularRecord;
use crate::error::IridlError;
use crate::fetch::fetcher::{DataFetcher, HttpFetcher};
use crate::pipeline::{fetch_record, materialize};
use crate::query::grammar::Grammar;
use crate::query::state::QueryState;
use bon::bon;
use std::sync::Arc;

/// Client for the IRI Data Library.
///
/// The client owns a [`DataFetcher`] (HTTP by default), a [`Grammar`] shared by every
/// query it creates, and a [`ClientConfig`]. Queries are plain values: build them with
/// [`IriClient::query`] and hand them to [`IriClient::series`] or [`IriClient::record`].
///
/// # Examples
///
/// ```rust,no_run
/// # use iridl::{DataFetcher, IriClient, IridlError};
/// # async fn run<F: DataFetcher>(client: &IriClient<F>) -> Result<(), IridlError> {
/// let query = client
///     .query()
///     .with_variable("air_temperature")?
///     .filter_point(45.67, -85.553)?
///     .aggregate("runningAverage", "12")?;
///
/// let table = client.series().query(&query).call().await?;
/// println!("{}", table.to_dataframe()?);
/// # Ok(())
/// # }
/// ```
pub struct IriClient<F = HttpFetcher> {
    fetcher: F,
    grammar: Arc<Grammar>,
    config: ClientConfig,
}

#[cfg(feature = "netcdf")]
impl IriClient<HttpFetcher> {
    /// Creates a client for the public Data Library with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`IridlError::Fetch`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use iridl::{IriClient, IridlError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), IridlError> {
    /// let client = IriClient::new()?;
    /// let query = client.query().with_variable("precipitation")?.filter_point(0.0, 36.8)?;
    /// let table = client.series().query(&query).call().await?;
    /// println!("{} rows", table.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Result<Self, IridlError> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates an HTTP client with custom transport and batch settings.
    pub fn with_config(config: ClientConfig) -> Result<Self, IridlError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(fetcher, config))
    }
}

#[bon]
impl<F: DataFetcher> IriClient<F> {
    /// Creates a client around any [`DataFetcher`], using the default grammar.
    pub fn with_fetcher(fetcher: F, config: ClientConfig) -> Self {
        Self {
            fetcher,
            grammar: Arc::new(Grammar::default()),
            config,
        }
    }

    /// Replaces the grammar used by queries created after this call.
    pub fn with_grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = Arc::new(grammar);
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// A fresh query holding only the base marker of this client's grammar.
    pub fn query(&self) -> QueryState {
        QueryState::from_shared_grammar(Arc::clone(&self.grammar))
    }

    /// Fetches `query` and reads the named dimensions without any time handling.
    ///
    /// # Arguments
    ///
    /// * `.query(&QueryState)`: **Required.** The query to fetch.
    /// * `.dimensions(Vec<String>)`: **Required.** Names to read from the fetched file.
    ///
    /// # Errors
    ///
    /// [`IridlError::Fetch`] when the download fails and [`IridlError::Dataset`] when a
    /// dimension is absent or unreadable.
    #[builder]
    pub async fn record(
        &self,
        query: &QueryState,
        dimensions: Vec<String>,
    ) -> Result<DatasetRecord, IridlError> {
        fetch_record(&self.fetcher, query, dimensions).await
    }

    /// Fetches `query` and assembles a table indexed by calendar date.
    ///
    /// # Arguments
    ///
    /// * `.query(&QueryState)`: **Required.** The query to fetch.
    /// * `.time_dimension(&str)`: Optional. Name of the time dimension. Defaults to `"T"`.
    /// * `.value_dimensions(Vec<String>)`: Optional. Value columns to read. Defaults to the
    ///   in-file names of the query's selected variables (`temp` for `air_temperature`).
    ///
    /// # Errors
    ///
    /// Besides fetch failures, returns [`IridlError::Dataset`] when the time dimension has
    /// no usable `units`, when a dimension is missing, or when columns differ in length.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use iridl::{DataFetcher, IriClient, IridlError};
    /// # async fn run<F: DataFetcher>(client: &IriClient<F>) -> Result<(), IridlError> {
    /// let query = client
    ///     .query()
    ///     .with_variable("soil_moisture")?
    ///     .filter_point(-1.29, 36.82)?;
    ///
    /// let table = client
    ///     .series()
    ///     .query(&query)
    ///     .time_dimension("T")
    ///     .value_dimensions(vec!["w".to_string()])
    ///     .call()
    ///     .await?;
    /// for row in table.rows().take(3) {
    ///     println!("{} {:?}", row.date, row.values.get("w"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn series(
        &self,
        query: &QueryState,
        time_dimension: Option<&str>,
        value_dimensions: Option<Vec<String>>,
    ) -> Result<TabularRecord, IridlError> {
        let time_dimension = time_dimension.unwrap_or(DEFAULT_TIME_DIMENSION);
        materialize(&self.fetcher, query, time_dimension, value_dimensions).await
    }

    /// Runs `request` at every site, at most [`ClientConfig::max_concurrency`] at a time.
    ///
    /// Never fails as a whole: each [`SiteResult`] carries its own outcome, in the
    /// order the sites were given.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use iridl::{BatchRequest, DataFetcher, IriClient, Site};
    /// # async fn run<F: DataFetcher>(client: &IriClient<F>) {
    /// let request = BatchRequest::builder()
    ///     .variable("air_temperature")
    ///     .aggregation(("average".to_string(), "12".to_string()))
    ///     .build();
    /// let sites = vec![Site::new("nairobi", -1.29, 36.82), Site::new("dakar", 14.72, -17.47)];
    ///
    /// for result in client.batch().request(&request).sites(sites).call().await {
    ///     match &result.outcome {
    ///         Ok(table) => println!("{}: {} rows", result.site.id, table.len()),
    ///         Err(e) => println!("{}: {:?} {}", result.site.id, e.kind(), e),
    ///     }
    /// }
    /// # }
    /// ```
    #[builder]
    pub async fn batch(&self, request: &BatchRequest, sites: Vec<Site>) -> Vec<SiteResult> {
        run_batch(&self.fetcher, &self.grammar, &self.config, request, sites).await
    }
}
