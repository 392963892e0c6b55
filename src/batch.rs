//! Runs one point-series pipeline per site, several at a time.
//!
//! Results come back in input order whatever order the downloads finish in, and a
//! failing site only fails its own [`SiteResult`].

use crate::config::ClientConfig;
use crate::dataset::tabular::TabularRecord;
use crate::error::{ErrorKind, IridlError};
use crate::fetch::fetcher::DataFetcher;
use crate::pipeline::materialize;
use crate::query::grammar::Grammar;
use crate::query::state::QueryState;
use bon::Builder;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use std::sync::Arc;

pub const DEFAULT_TIME_DIMENSION: &str = "T";

/// A named location to extract a series for.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Site {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }
}

/// What to extract at every site.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct BatchRequest {
    /// Catalog identifier, e.g. `air_temperature`.
    #[builder(into)]
    pub variable: String,

    /// Optional `(op, window)` temporal aggregation applied after the point filter.
    pub aggregation: Option<(String, String)>,

    /// Optional analysis operator applied last, e.g. `yearly-anomalies`.
    #[builder(into)]
    pub analysis: Option<String>,

    #[builder(into, default = DEFAULT_TIME_DIMENSION.to_string())]
    pub time_dimension: String,
}

impl BatchRequest {
    /// The query for one site: variable, point filter, then any aggregation and analysis.
    pub fn query_for(&self, grammar: &Arc<Grammar>, site: &Site) -> Result<QueryState, IridlError> {
        let mut query = QueryState::from_shared_grammar(Arc::clone(grammar))
            .with_variable(&self.variable)?
            .filter_point(site.latitude, site.longitude)?;
        if let Some((op, window)) = &self.aggregation {
            query = query.aggregate(op, window)?;
        }
        if let Some(op) = &self.analysis {
            query = query.analyze(op)?;
        }
        Ok(query)
    }
}

/// Outcome of one site's pipeline.
#[derive(Debug)]
pub struct SiteResult {
    pub site: Site,
    pub outcome: Result<TabularRecord, IridlError>,
}

impl SiteResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn record(&self) -> Option<&TabularRecord> {
        self.outcome.as_ref().ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.as_ref().err().map(IridlError::kind)
    }
}

async fn run_site<F: DataFetcher>(
    fetcher: &F,
    grammar: &Arc<Grammar>,
    request: &BatchRequest,
    site: &Site,
) -> Result<TabularRecord, IridlError> {
    let query = request.query_for(grammar, site)?;
    materialize(fetcher, &query, &request.time_dimension, None).await
}

/// Runs `request` for every site with at most `config.max_concurrency` pipelines in flight.
pub async fn run_batch<F: DataFetcher>(
    fetcher: &F,
    grammar: &Arc<Grammar>,
    config: &ClientConfig,
    request: &BatchRequest,
    sites: Vec<Site>,
) -> Vec<SiteResult> {
    let total = sites.len();
    let max_concurrency = config.effective_concurrency();
    info!(
        "Running {} pipelines for '{}' with concurrency {}",
        total, request.variable, max_concurrency
    );

    let results: Vec<SiteResult> = stream::iter(sites)
        .map(|site| async move {
            let outcome = run_site(fetcher, grammar, request, &site).await;
            if let Err(e) = &outcome {
                warn!("Site '{}' failed: {}", site.id, e);
            }
            SiteResult { site, outcome }
        })
        .buffered(max_concurrency)
        .collect()
        .await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    info!("Batch finished: {}/{} sites succeeded", succeeded, total);
    results
}
