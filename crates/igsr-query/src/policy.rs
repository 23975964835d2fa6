//! Allow-list and bounds applied to inbound queries

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Clause kinds accepted when no explicit list is configured.
pub const DEFAULT_QUERY_CLAUSES: &[&str] = &[
    "bool",
    "nested",
    "constant_score",
    "dis_max",
    "match_all",
    "match_none",
    "match",
    "match_phrase",
    "match_phrase_prefix",
    "multi_match",
    "query_string",
    "simple_query_string",
    "term",
    "terms",
    "range",
    "exists",
    "prefix",
    "wildcard",
    "ids",
];

/// Aggregation types accepted when no explicit list is configured.
pub const DEFAULT_AGGREGATIONS: &[&str] = &[
    "terms",
    "filter",
    "filters",
    "nested",
    "reverse_nested",
    "missing",
    "range",
    "histogram",
    "date_histogram",
    "cardinality",
    "value_count",
    "min",
    "max",
    "avg",
    "sum",
    "stats",
];

/// Clause kinds that wrap further queries the AST does not model. Their
/// inner clauses would escape the allow-list, so they are never permitted.
pub const UNMODELLED_COMPOUND_CLAUSES: &[&str] = &[
    "function_score",
    "boosting",
    "has_child",
    "has_parent",
    "pinned",
    "wrapper",
    "span_multi",
];

/// What a frontend search body may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPolicy {
    /// Permitted query clause kinds, compound kinds included
    #[serde(default = "default_clauses")]
    pub allowed_clauses: BTreeSet<String>,

    /// Permitted aggregation types
    #[serde(default = "default_aggregations")]
    pub allowed_aggregations: BTreeSet<String>,

    /// Largest page a single request may ask for
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Upper bound for `from + size`
    #[serde(default = "default_max_result_window")]
    pub max_result_window: usize,

    /// Upper bound for bucket aggregation `size`
    #[serde(default = "default_max_aggregation_size")]
    pub max_aggregation_size: usize,

    /// Deepest clause nesting accepted (root is depth 1)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            allowed_clauses: default_clauses(),
            allowed_aggregations: default_aggregations(),
            max_page_size: default_max_page_size(),
            max_result_window: default_max_result_window(),
            max_aggregation_size: default_max_aggregation_size(),
            max_depth: default_max_depth(),
        }
    }
}

impl QueryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size bound
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Set the `from + size` bound
    pub fn with_max_result_window(mut self, max_result_window: usize) -> Self {
        self.max_result_window = max_result_window;
        self
    }

    /// Replace the clause allow-list
    pub fn with_clauses<I, S>(mut self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_clauses = clauses.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the aggregation allow-list
    pub fn with_aggregations<I, S>(mut self, aggregations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_aggregations = aggregations.into_iter().map(Into::into).collect();
        self
    }

    pub fn allows_clause(&self, kind: &str) -> bool {
        self.allowed_clauses.contains(kind) && !UNMODELLED_COMPOUND_CLAUSES.contains(&kind)
    }

    /// Configured clause kinds that can never be honoured
    pub fn unmodelled_clauses(&self) -> Vec<&str> {
        self.allowed_clauses
            .iter()
            .map(String::as_str)
            .filter(|kind| UNMODELLED_COMPOUND_CLAUSES.contains(kind))
            .collect()
    }

    pub fn allows_aggregation(&self, kind: &str) -> bool {
        self.allowed_aggregations.contains(kind)
    }
}

fn default_clauses() -> BTreeSet<String> {
    DEFAULT_QUERY_CLAUSES.iter().map(|s| s.to_string()).collect()
}

fn default_aggregations() -> BTreeSet<String> {
    DEFAULT_AGGREGATIONS.iter().map(|s| s.to_string()).collect()
}

fn default_max_page_size() -> usize {
    100
}

fn default_max_result_window() -> usize {
    10_000
}

fn default_max_aggregation_size() -> usize {
    1_000
}

fn default_max_depth() -> usize {
    16
}
