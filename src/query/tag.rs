//! The tag vocabulary of an Ingrid query URL.
//!
//! A [`Tag`] is one step of a query: the root marker, a variable selection, a spatial
//! filter, a temporal aggregation or an analysis operator. Tags are immutable once built
//! and know how to render themselves into their URL segment.

use crate::query::error::QueryError;
use crate::query::url::format_decimal;
use ordered_float::OrderedFloat;
use std::fmt;
use std::str::FromStr;

/// Discriminant of a [`Tag`], used by ordering rules and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagKind {
    Base,
    VariableSelect,
    PointFilter,
    RegionFilter,
    TemporalAggregate,
    AnalysisOp,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagKind::Base => "base",
            TagKind::VariableSelect => "variable-select",
            TagKind::PointFilter => "point-filter",
            TagKind::RegionFilter => "region-filter",
            TagKind::TemporalAggregate => "temporal-aggregate",
            TagKind::AnalysisOp => "analysis-op",
        };
        write!(f, "{}", name)
    }
}

/// Statistical reductions the service applies along the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationOp {
    Average,
    RunningAverage,
    Sum,
    MinOver,
    MaxOver,
    RmsOver,
}

impl AggregationOp {
    pub const ALL: [AggregationOp; 6] = [
        AggregationOp::Average,
        AggregationOp::RunningAverage,
        AggregationOp::Sum,
        AggregationOp::MinOver,
        AggregationOp::MaxOver,
        AggregationOp::RmsOver,
    ];

    /// The keyword as it appears in the URL.
    pub fn keyword(&self) -> &'static str {
        match self {
            AggregationOp::Average => "average",
            AggregationOp::RunningAverage => "runningAverage",
            AggregationOp::Sum => "sum",
            AggregationOp::MinOver => "minover",
            AggregationOp::MaxOver => "maxover",
            AggregationOp::RmsOver => "rmsover",
        }
    }
}

impl FromStr for AggregationOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.keyword() == s)
            .ok_or_else(|| QueryError::UnknownAggregation(s.to_string()))
    }
}

impl fmt::Display for AggregationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Whole-series transforms such as climatologies and anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisOp {
    YearlyClimatology,
    YearlyAnomalies,
    MonthlyAverage,
}

impl AnalysisOp {
    pub const ALL: [AnalysisOp; 3] = [
        AnalysisOp::YearlyClimatology,
        AnalysisOp::YearlyAnomalies,
        AnalysisOp::MonthlyAverage,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            AnalysisOp::YearlyClimatology => "yearly-climatology",
            AnalysisOp::YearlyAnomalies => "yearly-anomalies",
            AnalysisOp::MonthlyAverage => "monthlyAverage",
        }
    }
}

impl FromStr for AnalysisOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.keyword() == s)
            .ok_or_else(|| QueryError::UnknownAnalysis(s.to_string()))
    }
}

impl fmt::Display for AnalysisOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// One query step. Coordinates are stored as [`OrderedFloat`] so tags, and the
/// queries built from them, can be compared and hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Root of the dataset catalog, e.g. `https://iridl.ldeo.columbia.edu/SOURCES`.
    Base { root: String },
    /// A variable identifier together with the catalog path it resolved to.
    VariableSelect { name: String, path: String },
    PointFilter {
        lat: OrderedFloat<f64>,
        lon: OrderedFloat<f64>,
    },
    RegionFilter {
        lat_min: OrderedFloat<f64>,
        lat_max: OrderedFloat<f64>,
        lon_min: OrderedFloat<f64>,
        lon_max: OrderedFloat<f64>,
    },
    TemporalAggregate { op: AggregationOp, window: String },
    AnalysisOp { op: AnalysisOp },
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Base { .. } => TagKind::Base,
            Tag::VariableSelect { .. } => TagKind::VariableSelect,
            Tag::PointFilter { .. } => TagKind::PointFilter,
            Tag::RegionFilter { .. } => TagKind::RegionFilter,
            Tag::TemporalAggregate { .. } => TagKind::TemporalAggregate,
            Tag::AnalysisOp { .. } => TagKind::AnalysisOp,
        }
    }

    /// Renders this tag's URL segment.
    pub fn segment(&self) -> String {
        match self {
            Tag::Base { root } => root.trim_end_matches('/').to_string(),
            Tag::VariableSelect { path, .. } => format!("/.{}", path),
            Tag::PointFilter { lat, lon } => format!(
                "/X/{}/VALUES/Y/{}/VALUES",
                format_decimal(lon.0),
                format_decimal(lat.0)
            ),
            Tag::RegionFilter {
                lat_min,
                lat_max,
                lon_min,
                lon_max,
            } => format!(
                "/X/{}/{}/RANGEEDGES/Y/{}/{}/RANGEEDGES",
                format_decimal(lon_min.0),
                format_decimal(lon_max.0),
                format_decimal(lat_min.0),
                format_decimal(lat_max.0)
            ),
            Tag::TemporalAggregate { op, window } => format!("/T/{}/{}/", window, op),
            Tag::AnalysisOp { op } => format!("/{}/", op),
        }
    }
}
