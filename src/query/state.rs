//! The append-only query value.
//!
//! Every composition method borrows the current [`QueryState`] and returns a new one
//! with exactly one extra [`Tag`], leaving the original untouched:
//!
//! ```
//! use iridl::QueryState;
//!
//! let base = QueryState::base();
//! let at_site = base
//!     .with_variable("air_temperature")?
//!     .filter_point(45.67, -85.553)?;
//!
//! assert_eq!(base.len(), 1);
//! assert_eq!(at_site.len(), 3);
//! # Ok::<(), iridl::QueryError>(())
//! ```

use crate::query::error::QueryError;
use crate::query::grammar::Grammar;
use crate::query::tag::{AggregationOp, AnalysisOp, Tag, TagKind};
use crate::query::url::generate;
use ordered_float::OrderedFloat;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An ordered, immutable sequence of tags that starts with the base marker.
///
/// Equality and hashing look at the tag sequence only; the grammar a state was
/// validated against does not take part.
#[derive(Debug, Clone)]
pub struct QueryState {
    tags: Vec<Tag>,
    grammar: Arc<Grammar>,
}

impl QueryState {
    /// A query holding only the base marker, validated by [`Grammar::default`].
    pub fn base() -> Self {
        Self::with_grammar(Grammar::default())
    }

    /// A query holding only the base marker, validated by `grammar` from here on.
    pub fn with_grammar(grammar: Grammar) -> Self {
        Self::from_shared_grammar(Arc::new(grammar))
    }

    pub(crate) fn from_shared_grammar(grammar: Arc<Grammar>) -> Self {
        Self {
            tags: vec![grammar.base_tag()],
            grammar,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Always false: a query holds at least its base marker.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Names of all selected variables, in selection order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::VariableSelect { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Names the selected variables carry inside fetched files: the last component
    /// of each catalog path (`temp` for `.../.deg0p5/.temp`).
    pub fn data_variables(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(|tag| match tag {
            Tag::VariableSelect { path, .. } => {
                let last = path.rsplit("/.").next().unwrap_or(path);
                Some(last.trim_start_matches('.'))
            }
            _ => None,
        })
    }

    /// Serializes the query into its URL, without the data-format suffix.
    pub fn to_url(&self) -> String {
        generate(self)
    }

    fn append(&self, tag: Tag) -> Result<QueryState, QueryError> {
        self.grammar.check_append(&self.tags, tag.kind())?;
        let mut tags = Vec::with_capacity(self.tags.len() + 1);
        tags.extend_from_slice(&self.tags);
        tags.push(tag);
        Ok(QueryState {
            tags,
            grammar: Arc::clone(&self.grammar),
        })
    }

    /// Selects a dataset variable by its identifier in the grammar's catalog.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownVariable`] if `name` is not catalogued, or
    /// [`QueryError::OrderingViolation`] if the grammar forbids the position.
    pub fn with_variable(&self, name: &str) -> Result<QueryState, QueryError> {
        let tag = self.grammar.resolve_variable(name)?;
        self.append(tag)
    }

    /// Restricts the query to the grid point nearest `lat`/`lon`. Bounds are inclusive.
    pub fn filter_point(&self, lat: f64, lon: f64) -> Result<QueryState, QueryError> {
        validate_latitude(lat)?;
        validate_longitude(lon)?;
        self.append(Tag::PointFilter {
            lat: OrderedFloat(lat),
            lon: OrderedFloat(lon),
        })
    }

    /// Restricts the query to a bounding box.
    pub fn filter_region(
        &self,
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    ) -> Result<QueryState, QueryError> {
        validate_latitude(lat_min)?;
        validate_latitude(lat_max)?;
        validate_longitude(lon_min)?;
        validate_longitude(lon_max)?;
        if lat_min > lat_max {
            return Err(QueryError::InvertedBounds {
                axis: "latitude",
                min: lat_min,
                max: lat_max,
            });
        }
        if lon_min > lon_max {
            return Err(QueryError::InvertedBounds {
                axis: "longitude",
                min: lon_min,
                max: lon_max,
            });
        }
        self.append(Tag::RegionFilter {
            lat_min: OrderedFloat(lat_min),
            lat_max: OrderedFloat(lat_max),
            lon_min: OrderedFloat(lon_min),
            lon_max: OrderedFloat(lon_max),
        })
    }

    /// Applies a temporal reduction such as `runningAverage` over `window` along `T`.
    ///
    /// `window` is passed through to the URL verbatim, so it must be a single non-empty
    /// path segment (no `/` and no whitespace).
    pub fn aggregate(&self, op: &str, window: &str) -> Result<QueryState, QueryError> {
        let op: AggregationOp = op.parse()?;
        if window.is_empty() || window.contains('/') || window.chars().any(char::is_whitespace) {
            return Err(QueryError::InvalidWindow(window.to_string()));
        }
        self.append(Tag::TemporalAggregate {
            op,
            window: window.to_string(),
        })
    }

    /// Applies a whole-series analysis operator such as `yearly-anomalies`.
    pub fn analyze(&self, op: &str) -> Result<QueryState, QueryError> {
        let op: AnalysisOp = op.parse()?;
        self.append(Tag::AnalysisOp { op })
    }

    pub(crate) fn has_kind(&self, kind: TagKind) -> bool {
        self.tags.iter().any(|tag| tag.kind() == kind)
    }
}

fn validate_latitude(lat: f64) -> Result<(), QueryError> {
    if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(QueryError::LatitudeOutOfRange(lat))
    }
}

fn validate_longitude(lon: f64) -> Result<(), QueryError> {
    if lon.is_finite() && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(QueryError::LongitudeOutOfRange(lon))
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::base()
    }
}

impl PartialEq for QueryState {
    fn eq(&self, other: &Self) -> bool {
        self.tags == other.tags
    }
}

impl Eq for QueryState {}

impl Hash for QueryState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tags.hash(state);
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", generate(self))
    }
}

/// Starts a new query with the default grammar.
pub fn base() -> QueryState {
    QueryState::base()
}

pub fn with_variable(state: &QueryState, name: &str) -> Result<QueryState, QueryError> {
    state.with_variable(name)
}

pub fn filter_point(state: &QueryState, lat: f64, lon: f64) -> Result<QueryState, QueryError> {
    state.filter_point(lat, lon)
}

pub fn filter_region(
    state: &QueryState,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
) -> Result<QueryState, QueryError> {
    state.filter_region(lat_min, lat_max, lon_min, lon_max)
}

pub fn aggregate(state: &QueryState, op: &str, window: &str) -> Result<QueryState, QueryError> {
    state.aggregate(op, window)
}

pub fn analyze(state: &QueryState, op: &str) -> Result<QueryState, QueryError> {
    state.analyze(op)
}
