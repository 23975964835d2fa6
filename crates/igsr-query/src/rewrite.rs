//! Per-resource query rewrites
//!
//! The frontend still sends legacy or analysed field names in exact-match
//! filters and expects free-text boxes to match substrings. Rewrites run on
//! the validated AST, after the allow-list check, so the clauses they
//! introduce (`wildcard`, `match_none`, `bool`) never need to be permitted
//! for callers.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::{ast::QueryClause, validator::ValidatedSearch};

/// Clause kinds whose `query` text is free text.
const TEXT_QUERY_KINDS: &[&str] = &["multi_match", "query_string", "simple_query_string"];

/// Clause kinds keyed by field with free text values.
const FIELD_TEXT_KINDS: &[&str] = &["match", "match_phrase"];

/// Explicit field renames applied before the generic `.keyword` rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Map a field name to its exact-match `.keyword` counterpart.
///
/// Order: already `.keyword`, explicit map, `.std` / `.keywords` suffixes,
/// then the two legacy names the frontend still uses. Anything else is
/// returned unchanged.
pub fn keyword_field(field: &str, map: Option<&FieldMap>) -> String {
    if field.ends_with(".keyword") {
        return field.to_string();
    }
    if let Some(mapped) = map.and_then(|map| map.get(field)) {
        return mapped.to_string();
    }
    if let Some(stem) = field.strip_suffix(".std") {
        return format!("{stem}.keyword");
    }
    if let Some(stem) = field.strip_suffix(".keywords") {
        return format!("{stem}.keyword");
    }
    match field {
        "url" => "url.keyword".to_string(),
        "dataCollections.title" => "dataCollections.title.keyword".to_string(),
        _ => field.to_string(),
    }
}

/// One rewrite step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// Replace a top-level free-text query shorter than `min_len` with `match_none`
    GateShortText { min_len: usize },
    /// Point `term` / `terms` clauses at exact-match fields
    KeywordFields { fields: FieldMap },
    /// Widen `multi_match` with case-insensitive wildcard fallbacks
    MatchFallback,
}

impl RewriteRule {
    fn apply(&self, search: &mut ValidatedSearch) {
        let body = search.body_mut();
        match self {
            RewriteRule::GateShortText { min_len } => {
                if let Some(query) = body.query.as_ref() {
                    if is_short_text(query, *min_len) {
                        debug!(min_len = *min_len, "free-text query too short, matching nothing");
                        body.query = Some(QueryClause::match_none());
                    }
                }
            }
            RewriteRule::KeywordFields { fields } => {
                let mut rewrite = |clause| rewrite_term_fields(clause, fields);
                rewrite_all_clauses(body, &mut rewrite);
            }
            RewriteRule::MatchFallback => {
                rewrite_all_clauses(body, &mut add_wildcard_fallbacks);
            }
        }
    }
}

/// Ordered rewrite pipeline for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rewriter {
    rules: Vec<RewriteRule>,
}

impl Rewriter {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Pipeline that changes nothing
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn apply(&self, mut search: ValidatedSearch) -> ValidatedSearch {
        for rule in &self.rules {
            rule.apply(&mut search);
        }
        search
    }
}

fn rewrite_all_clauses<F>(body: &mut crate::ast::SearchBody, f: &mut F)
where
    F: FnMut(QueryClause) -> QueryClause,
{
    body.query = body.query.take().map(|query| query.transform(f));
    body.post_filter = body.post_filter.take().map(|filter| filter.transform(f));
    body.aggregations = std::mem::take(&mut body.aggregations)
        .into_iter()
        .map(|(name, aggregation)| {
            let mut transform = |clause: QueryClause| clause.transform(f);
            (name, aggregation.transform_clauses(&mut transform))
        })
        .collect();
}

fn is_short_text(query: &QueryClause, min_len: usize) -> bool {
    let QueryClause::Leaf { kind, body } = query else {
        return false;
    };

    let too_short = |value: Option<&Value>| text_of(value).trim().chars().count() < min_len;

    if TEXT_QUERY_KINDS.contains(&kind.as_str()) {
        return body.is_object() && too_short(body.get("query"));
    }

    if FIELD_TEXT_KINDS.contains(&kind.as_str()) {
        if let Some(fields) = body.as_object() {
            return fields.values().any(|spec| match spec {
                Value::Object(_) => too_short(spec.get("query")),
                Value::String(_) => too_short(Some(spec)),
                _ => false,
            });
        }
    }

    false
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn rewrite_term_fields(clause: QueryClause, fields: &FieldMap) -> QueryClause {
    match clause {
        QueryClause::Leaf {
            kind,
            body: Value::Object(entries),
        } if kind == "term" || kind == "terms" => {
            let body = entries
                .into_iter()
                .map(|(field, value)| (keyword_field(&field, Some(fields)), value))
                .collect::<Map<String, Value>>();
            QueryClause::Leaf {
                kind,
                body: Value::Object(body),
            }
        }
        other => other,
    }
}

fn add_wildcard_fallbacks(clause: QueryClause) -> QueryClause {
    match clause {
        QueryClause::Leaf {
            kind,
            body: Value::Object(options),
        } if kind == "multi_match" => widen_multi_match(kind, options),
        other => other,
    }
}

fn widen_multi_match(kind: String, mut options: Map<String, Value>) -> QueryClause {
    let text = decode_plus(text_of(options.get("query")).trim());
    options.insert("query".to_string(), Value::String(text.clone()));

    let fallbacks: Vec<QueryClause> = options
        .get("fields")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(|field| keyword_field(field, None))
        .filter(|field| field.ends_with(".keyword"))
        .map(|field| {
            QueryClause::leaf(
                "wildcard",
                json!({ field: { "value": wildcard_pattern(&text), "case_insensitive": true } }),
            )
        })
        .collect();

    let mut should = vec![QueryClause::Leaf {
        kind,
        body: Value::Object(options),
    }];
    should.extend(fallbacks);

    let mut bool_options = Map::new();
    bool_options.insert("minimum_should_match".to_string(), Value::from(1));
    QueryClause::Bool(crate::ast::BoolQuery {
        should,
        options: bool_options,
        ..Default::default()
    })
}

/// URL-encoded search box input arrives with `+` for spaces. Only decode
/// when the text has no real spaces, so literal plus signs survive.
fn decode_plus(text: &str) -> String {
    if !text.contains(' ') && text.contains('+') {
        text.replace('+', " ")
    } else {
        text.to_string()
    }
}

fn wildcard_pattern(text: &str) -> String {
    let text = text.trim();
    if text.contains('*') {
        text.to_string()
    } else {
        format!("*{text}*")
    }
}
