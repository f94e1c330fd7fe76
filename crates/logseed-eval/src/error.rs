//! Evaluation-specific error types.

use thiserror::Error;

/// Errors that can occur while turning a rule into query strings.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The rule uses a feature the evaluator does not model
    /// (keyword searches, aggregations, `N of` counting).
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A modifier token the pipeline does not recognize.
    #[error("unknown modifier {0}")]
    UnknownModifier(String),

    /// A comparator modifier appeared before the end of the chain.
    #[error("comparator modifier {0} must be the last modifier")]
    ComparatorNotLast(String),

    /// A matcher value was a non-scalar (sequence or mapping).
    #[error("expected scalar field matching value got: {0}")]
    InvalidMatcherValue(String),

    /// A `%placeholder%` value could not be expanded.
    #[error("can't expand placeholder {0}: {1}")]
    UnresolvedPlaceholder(String, String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, EvalError>;
