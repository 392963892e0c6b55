//! Client settings. Everything has a default, so `ClientConfig::default()` works
//! against the public Data Library.

use bon::Builder;
use std::time::Duration;

pub const DEFAULT_DATA_SUFFIX: &str = "data.nc";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Transport and batch settings for [`crate::IriClient`].
///
/// ```
/// use iridl::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .timeout(Duration::from_secs(30))
///     .max_concurrency(8)
///     .build();
/// assert_eq!(config.data_suffix, "data.nc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ClientConfig {
    /// File-format selector appended to every query, e.g. `data.nc`.
    #[builder(into, default = DEFAULT_DATA_SUFFIX.to_string())]
    pub data_suffix: String,

    /// Whole-request timeout for one download.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,

    /// Upper bound on pipelines in flight during a batch. Zero is treated as one.
    #[builder(default = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    #[builder(into, default = concat!("iridl-rs/", env!("CARGO_PKG_VERSION")).to_string())]
    pub user_agent: String,
}

impl ClientConfig {
    pub(crate) fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
