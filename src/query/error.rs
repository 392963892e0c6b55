use crate::query::tag::TagKind;
use thiserror::Error;

/// Rejections raised while composing a query, before anything touches the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("Inverted {axis} bounds: min {min} is greater than max {max}")]
    InvertedBounds {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Unknown aggregation '{0}'")]
    UnknownAggregation(String),

    #[error("Unknown analysis operator '{0}'")]
    UnknownAnalysis(String),

    #[error("Invalid aggregation window '{0}'")]
    InvalidWindow(String),

    #[error("A {tag} tag requires an earlier {prerequisite} tag")]
    OrderingViolation {
        tag: TagKind,
        prerequisite: TagKind,
    },
}
