//! Query handling for the IGSR search gateway
//!
//! Inbound search bodies are untrusted. This crate turns them into a typed
//! AST, checks them against a configurable allow-list and applies the
//! per-resource rewrites the frontend relies on before anything is sent to
//! the search engine.
//!
//! ## Features
//!
//! - **Typed AST**: `QueryClause` and `Aggregation` trees instead of raw JSON probing
//! - **Allow-list validation**: clause and aggregation kinds, page bounds, depth, no scripting
//! - **Pure**: validation and rewrites never perform I/O
//! - **Rewrites**: short-text gating, `.keyword` field mapping, wildcard fallbacks

pub mod ast;
pub mod error;
pub mod policy;
pub mod rewrite;
pub mod validator;

pub use ast::{Aggregation, AggregationBody, BoolQuery, ClauseVisitor, QueryClause, SearchBody};
pub use error::{Result, ValidationError};
pub use policy::{QueryPolicy, UNMODELLED_COMPOUND_CLAUSES};
pub use rewrite::{keyword_field, FieldMap, RewriteRule, Rewriter};
pub use validator::{QueryValidator, ValidatedSearch};
