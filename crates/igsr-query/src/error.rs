//! Query validation error types

use thiserror::Error;

/// Result type for query handling
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Reasons a search body is refused before it reaches the engine.
///
/// Messages only ever echo what the caller sent, so they are safe to
/// return to the frontend verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Body was not a JSON object
    #[error("search body must be a JSON object")]
    NotAnObject,

    /// Top-level search option outside the permitted set
    #[error("unsupported search option `{0}`")]
    UnsupportedOption(String),

    /// Clause or option with an unexpected shape
    #[error("malformed search body: {0}")]
    Malformed(String),

    /// Query clause kind not in the allow-list
    #[error("query clause `{0}` is not permitted")]
    ForbiddenClause(String),

    /// Aggregation kind not in the allow-list
    #[error("aggregation type `{0}` is not permitted")]
    ForbiddenAggregation(String),

    /// Any form of engine-side scripting
    #[error("scripting is not permitted (`{0}`)")]
    Scripting(String),

    /// `terms` lookup against another document
    #[error("terms lookup is not permitted")]
    TermsLookup,

    /// Clause tree nested deeper than allowed
    #[error("query nesting exceeds maximum depth {0}")]
    TooDeep(usize),

    /// Requested page larger than the configured maximum
    #[error("page size {size} exceeds maximum {max}")]
    PageSizeTooLarge { size: i64, max: usize },

    /// Negative page size other than the `-1` sentinel
    #[error("page size must be -1 or non-negative, got {0}")]
    NegativePageSize(i64),

    /// Negative offset
    #[error("offset must be non-negative, got {0}")]
    NegativeOffset(i64),

    /// `from + size` past the engine result window
    #[error("result window {window} exceeds maximum {max}")]
    WindowTooLarge { window: u64, max: usize },

    /// Bucket aggregation asking for too many buckets
    #[error("aggregation `{name}` requests {size} buckets, maximum is {max}")]
    AggregationTooLarge { name: String, size: u64, max: usize },
}
