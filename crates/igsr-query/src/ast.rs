//! Typed representation of engine search bodies
//!
//! The engine query DSL is an open-ended JSON tree. Parsing it into
//! [`QueryClause`] and [`Aggregation`] values lets validation and rewrites
//! match on variants instead of probing attributes, and makes the
//! structure that is eventually re-serialized explicit.

use serde_json::{Map, Value};

use crate::error::{Result, ValidationError};

/// Keys that enable engine-side scripting, refused wherever they appear.
pub const SCRIPT_KEYS: &[&str] = &[
    "script",
    "_script",
    "script_score",
    "script_fields",
    "scripted_metric",
    "runtime_mappings",
];

/// Top-level options forwarded to the engine untouched once the body is accepted.
pub const PASSTHROUGH_OPTIONS: &[&str] = &[
    "sort",
    "_source",
    "track_total_hits",
    "highlight",
    "search_after",
];

/// One node of a query tree.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    /// `bool` compound clause
    Bool(BoolQuery),
    /// `nested` clause wrapping a query on a nested path
    Nested {
        path: String,
        query: Box<QueryClause>,
        options: Map<String, Value>,
    },
    /// `constant_score` wrapping a filter
    ConstantScore {
        filter: Box<QueryClause>,
        options: Map<String, Value>,
    },
    /// `dis_max` over several queries
    DisMax {
        queries: Vec<QueryClause>,
        options: Map<String, Value>,
    },
    /// Any non-compound clause (`match`, `term`, `range`, ...)
    Leaf { kind: String, body: Value },
}

/// Occurrence lists of a `bool` clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<QueryClause>,
    pub filter: Vec<QueryClause>,
    pub should: Vec<QueryClause>,
    pub must_not: Vec<QueryClause>,
    /// `minimum_should_match`, `boost`, `_name`
    pub options: Map<String, Value>,
}

/// Visits every clause of a tree in pre-order.
pub trait ClauseVisitor {
    type Error;

    /// Called once per clause; `depth` is 1 for the root.
    fn visit(&mut self, clause: &QueryClause, depth: usize) -> std::result::Result<(), Self::Error>;
}

impl QueryClause {
    pub fn leaf(kind: impl Into<String>, body: Value) -> Self {
        QueryClause::Leaf {
            kind: kind.into(),
            body,
        }
    }

    pub fn match_all() -> Self {
        Self::leaf("match_all", Value::Object(Map::new()))
    }

    pub fn match_none() -> Self {
        Self::leaf("match_none", Value::Object(Map::new()))
    }

    /// Clause kind as it appears in the DSL.
    pub fn kind(&self) -> &str {
        match self {
            QueryClause::Bool(_) => "bool",
            QueryClause::Nested { .. } => "nested",
            QueryClause::ConstantScore { .. } => "constant_score",
            QueryClause::DisMax { .. } => "dis_max",
            QueryClause::Leaf { kind, .. } => kind,
        }
    }

    /// Parse a single `{ "<kind>": { ... } }` clause object.
    pub fn parse(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| malformed("query clause must be an object"))?;

        let mut entries = object.iter();
        let (kind, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(malformed("query clause is empty")),
            _ => return Err(malformed("query clause must have exactly one key")),
        };

        match kind.as_str() {
            "bool" => BoolQuery::parse(body).map(QueryClause::Bool),
            "nested" => {
                let mut options = expect_object(kind, body)?.clone();
                let path = match options.remove("path") {
                    Some(Value::String(path)) => path,
                    _ => return Err(malformed("`nested` requires a string `path`")),
                };
                let query = options
                    .remove("query")
                    .ok_or_else(|| malformed("`nested` requires a `query`"))?;
                Ok(QueryClause::Nested {
                    path,
                    query: Box::new(Self::parse(&query)?),
                    options,
                })
            }
            "constant_score" => {
                let mut options = expect_object(kind, body)?.clone();
                let filter = options
                    .remove("filter")
                    .ok_or_else(|| malformed("`constant_score` requires a `filter`"))?;
                Ok(QueryClause::ConstantScore {
                    filter: Box::new(Self::parse(&filter)?),
                    options,
                })
            }
            "dis_max" => {
                let mut options = expect_object(kind, body)?.clone();
                let queries = match options.remove("queries") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(Self::parse)
                        .collect::<Result<Vec<_>>>()?,
                    _ => return Err(malformed("`dis_max` requires a `queries` array")),
                };
                Ok(QueryClause::DisMax { queries, options })
            }
            _ => Ok(QueryClause::Leaf {
                kind: kind.clone(),
                body: body.clone(),
            }),
        }
    }

    /// Serialize back into the engine DSL.
    pub fn into_value(self) -> Value {
        let (kind, body) = match self {
            QueryClause::Bool(query) => ("bool".to_string(), query.into_value()),
            QueryClause::Nested {
                path,
                query,
                mut options,
            } => {
                options.insert("path".to_string(), Value::String(path));
                options.insert("query".to_string(), query.into_value());
                ("nested".to_string(), Value::Object(options))
            }
            QueryClause::ConstantScore { filter, mut options } => {
                options.insert("filter".to_string(), filter.into_value());
                ("constant_score".to_string(), Value::Object(options))
            }
            QueryClause::DisMax {
                queries,
                mut options,
            } => {
                let queries = queries.into_iter().map(QueryClause::into_value).collect();
                options.insert("queries".to_string(), Value::Array(queries));
                ("dis_max".to_string(), Value::Object(options))
            }
            QueryClause::Leaf { kind, body } => (kind, body),
        };

        let mut clause = Map::new();
        clause.insert(kind, body);
        Value::Object(clause)
    }

    /// Direct children of this clause.
    pub fn children(&self) -> Vec<&QueryClause> {
        match self {
            QueryClause::Bool(query) => query
                .must
                .iter()
                .chain(&query.filter)
                .chain(&query.should)
                .chain(&query.must_not)
                .collect(),
            QueryClause::Nested { query, .. } => vec![query.as_ref()],
            QueryClause::ConstantScore { filter, .. } => vec![filter.as_ref()],
            QueryClause::DisMax { queries, .. } => queries.iter().collect(),
            QueryClause::Leaf { .. } => Vec::new(),
        }
    }

    pub fn accept<V: ClauseVisitor + ?Sized>(
        &self,
        visitor: &mut V,
    ) -> std::result::Result<(), V::Error> {
        self.accept_at(visitor, 1)
    }

    fn accept_at<V: ClauseVisitor + ?Sized>(
        &self,
        visitor: &mut V,
        depth: usize,
    ) -> std::result::Result<(), V::Error> {
        visitor.visit(self, depth)?;
        for child in self.children() {
            child.accept_at(visitor, depth + 1)?;
        }
        Ok(())
    }

    /// Rebuild the tree bottom-up. `f` sees every node after its children
    /// were transformed; the node it returns is not revisited.
    pub fn transform<F>(self, f: &mut F) -> QueryClause
    where
        F: FnMut(QueryClause) -> QueryClause,
    {
        let rebuilt = match self {
            QueryClause::Bool(query) => QueryClause::Bool(BoolQuery {
                must: transform_all(query.must, f),
                filter: transform_all(query.filter, f),
                should: transform_all(query.should, f),
                must_not: transform_all(query.must_not, f),
                options: query.options,
            }),
            QueryClause::Nested {
                path,
                query,
                options,
            } => QueryClause::Nested {
                path,
                query: Box::new(query.transform(f)),
                options,
            },
            QueryClause::ConstantScore { filter, options } => QueryClause::ConstantScore {
                filter: Box::new(filter.transform(f)),
                options,
            },
            QueryClause::DisMax { queries, options } => QueryClause::DisMax {
                queries: transform_all(queries, f),
                options,
            },
            leaf @ QueryClause::Leaf { .. } => leaf,
        };
        f(rebuilt)
    }
}

fn transform_all<F>(clauses: Vec<QueryClause>, f: &mut F) -> Vec<QueryClause>
where
    F: FnMut(QueryClause) -> QueryClause,
{
    clauses.into_iter().map(|clause| clause.transform(f)).collect()
}

impl BoolQuery {
    fn parse(body: &Value) -> Result<Self> {
        let object = expect_object("bool", body)?;
        let mut query = BoolQuery::default();

        for (key, value) in object {
            let target = match key.as_str() {
                "must" => &mut query.must,
                "filter" => &mut query.filter,
                "should" => &mut query.should,
                "must_not" => &mut query.must_not,
                _ => {
                    query.options.insert(key.clone(), value.clone());
                    continue;
                }
            };

            match value {
                Value::Array(items) => {
                    for item in items {
                        target.push(QueryClause::parse(item)?);
                    }
                }
                Value::Object(_) => target.push(QueryClause::parse(value)?),
                _ => {
                    return Err(malformed(format!(
                        "`bool.{key}` must be a clause or a list of clauses"
                    )))
                }
            }
        }

        Ok(query)
    }

    fn into_value(self) -> Value {
        let mut body = self.options;
        for (key, clauses) in [
            ("must", self.must),
            ("filter", self.filter),
            ("should", self.should),
            ("must_not", self.must_not),
        ] {
            if !clauses.is_empty() {
                let clauses = clauses.into_iter().map(QueryClause::into_value).collect();
                body.insert(key.to_string(), Value::Array(clauses));
            }
        }
        Value::Object(body)
    }
}

/// Body of a single aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationBody {
    /// `filter` aggregation; its body is a query clause
    Filter(QueryClause),
    /// `filters` aggregation; unnamed filters come from the array form
    Filters {
        filters: Vec<(Option<String>, QueryClause)>,
        options: Map<String, Value>,
    },
    /// Every other aggregation type, forwarded as-is
    Other(Value),
}

/// One named aggregation with its sub-aggregations.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub kind: String,
    pub body: AggregationBody,
    pub sub_aggregations: Vec<(String, Aggregation)>,
    pub meta: Option<Value>,
}

impl Aggregation {
    pub fn parse(name: &str, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| malformed(format!("aggregation `{name}` must be an object")))?;

        let mut typed = None;
        let mut sub_aggregations = Vec::new();
        let mut meta = None;

        for (key, body) in object {
            match key.as_str() {
                "aggs" | "aggregations" => sub_aggregations.extend(parse_aggregations(body)?),
                "meta" => meta = Some(body.clone()),
                _ => {
                    if typed.is_some() {
                        return Err(malformed(format!(
                            "aggregation `{name}` declares more than one type"
                        )));
                    }
                    typed = Some((key, body));
                }
            }
        }

        let (kind, body) =
            typed.ok_or_else(|| malformed(format!("aggregation `{name}` has no type")))?;

        let body = match kind.as_str() {
            "filter" => AggregationBody::Filter(QueryClause::parse(body)?),
            "filters" => {
                let mut options = expect_object(kind, body)?.clone();
                let filters = match options.remove("filters") {
                    Some(Value::Object(named)) => named
                        .iter()
                        .map(|(key, clause)| Ok((Some(key.clone()), QueryClause::parse(clause)?)))
                        .collect::<Result<Vec<_>>>()?,
                    Some(Value::Array(unnamed)) => unnamed
                        .iter()
                        .map(|clause| Ok((None, QueryClause::parse(clause)?)))
                        .collect::<Result<Vec<_>>>()?,
                    _ => {
                        return Err(malformed(format!(
                            "aggregation `{name}` requires `filters`"
                        )))
                    }
                };
                AggregationBody::Filters { filters, options }
            }
            _ => AggregationBody::Other(body.clone()),
        };

        Ok(Aggregation {
            kind: kind.clone(),
            body,
            sub_aggregations,
            meta,
        })
    }

    /// Largest bucket count requested through `size` or `shard_size`.
    /// Both must be non-negative integers when present.
    pub fn requested_size(&self) -> Result<Option<u64>> {
        let AggregationBody::Other(body) = &self.body else {
            return Ok(None);
        };

        let mut largest = None;
        for key in ["size", "shard_size"] {
            match body.get(key) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    let size = value.as_u64().ok_or_else(|| {
                        malformed(format!(
                            "`{key}` of a `{}` aggregation must be a non-negative integer",
                            self.kind
                        ))
                    })?;
                    largest = largest.max(Some(size));
                }
            }
        }
        Ok(largest)
    }

    /// Query clauses embedded in the aggregation body.
    pub fn clauses(&self) -> Vec<&QueryClause> {
        match &self.body {
            AggregationBody::Filter(clause) => vec![clause],
            AggregationBody::Filters { filters, .. } => {
                filters.iter().map(|(_, clause)| clause).collect()
            }
            AggregationBody::Other(_) => Vec::new(),
        }
    }

    /// Apply `f` to every embedded clause, recursing into sub-aggregations.
    pub fn transform_clauses<F>(self, f: &mut F) -> Aggregation
    where
        F: FnMut(QueryClause) -> QueryClause,
    {
        let body = match self.body {
            AggregationBody::Filter(clause) => AggregationBody::Filter(f(clause)),
            AggregationBody::Filters { filters, options } => AggregationBody::Filters {
                filters: filters
                    .into_iter()
                    .map(|(name, clause)| (name, f(clause)))
                    .collect(),
                options,
            },
            other @ AggregationBody::Other(_) => other,
        };

        Aggregation {
            kind: self.kind,
            body,
            sub_aggregations: self
                .sub_aggregations
                .into_iter()
                .map(|(name, aggregation)| (name, aggregation.transform_clauses(f)))
                .collect(),
            meta: self.meta,
        }
    }

    pub fn into_value(self) -> Value {
        let body = match self.body {
            AggregationBody::Filter(clause) => clause.into_value(),
            AggregationBody::Filters {
                filters,
                mut options,
            } => {
                let filters = if filters.iter().all(|(name, _)| name.is_some()) {
                    Value::Object(
                        filters
                            .into_iter()
                            .map(|(name, clause)| (name.unwrap_or_default(), clause.into_value()))
                            .collect(),
                    )
                } else {
                    Value::Array(
                        filters
                            .into_iter()
                            .map(|(_, clause)| clause.into_value())
                            .collect(),
                    )
                };
                options.insert("filters".to_string(), filters);
                Value::Object(options)
            }
            AggregationBody::Other(body) => body,
        };

        let mut object = Map::new();
        object.insert(self.kind, body);
        if !self.sub_aggregations.is_empty() {
            object.insert(
                "aggs".to_string(),
                aggregations_into_value(self.sub_aggregations),
            );
        }
        if let Some(meta) = self.meta {
            object.insert("meta".to_string(), meta);
        }
        Value::Object(object)
    }
}

/// Parse an `aggs` object into named aggregations.
pub fn parse_aggregations(value: &Value) -> Result<Vec<(String, Aggregation)>> {
    let object = value
        .as_object()
        .ok_or_else(|| malformed("`aggs` must be an object"))?;
    object
        .iter()
        .map(|(name, body)| Ok((name.clone(), Aggregation::parse(name, body)?)))
        .collect()
}

fn aggregations_into_value(aggregations: Vec<(String, Aggregation)>) -> Value {
    Value::Object(
        aggregations
            .into_iter()
            .map(|(name, aggregation)| (name, aggregation.into_value()))
            .collect(),
    )
}

/// A parsed search request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchBody {
    pub query: Option<QueryClause>,
    pub post_filter: Option<QueryClause>,
    pub size: Option<i64>,
    pub from: Option<i64>,
    pub aggregations: Vec<(String, Aggregation)>,
    /// Entries of [`PASSTHROUGH_OPTIONS`] present in the request
    pub options: Map<String, Value>,
    /// Clauses carried inside `highlight` and `sort`. They are checked like
    /// any other clause but reach the engine through `options` unchanged.
    pub embedded: Vec<QueryClause>,
}

impl SearchBody {
    /// Parse a whole search body. Scripting keys are refused before any
    /// structure is inspected.
    pub fn parse(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

        if let Some(key) = find_script_key(value) {
            return Err(ValidationError::Scripting(key.to_string()));
        }

        let mut body = SearchBody::default();
        for (key, value) in object {
            match key.as_str() {
                "query" => body.query = Some(QueryClause::parse(value)?),
                "post_filter" => body.post_filter = Some(QueryClause::parse(value)?),
                "size" => body.size = optional_integer(key, value)?,
                "from" => body.from = optional_integer(key, value)?,
                "aggs" | "aggregations" => body.aggregations.extend(parse_aggregations(value)?),
                option if PASSTHROUGH_OPTIONS.contains(&option) => {
                    collect_embedded(key, value, &mut body.embedded)?;
                    body.options.insert(key.clone(), value.clone());
                }
                _ => return Err(ValidationError::UnsupportedOption(key.clone())),
            }
        }

        Ok(body)
    }

    pub fn into_value(self) -> Value {
        let mut object = self.options;
        if let Some(query) = self.query {
            object.insert("query".to_string(), query.into_value());
        }
        if let Some(post_filter) = self.post_filter {
            object.insert("post_filter".to_string(), post_filter.into_value());
        }
        if let Some(size) = self.size {
            object.insert("size".to_string(), Value::from(size));
        }
        if let Some(from) = self.from {
            object.insert("from".to_string(), Value::from(from));
        }
        if !self.aggregations.is_empty() {
            object.insert(
                "aggs".to_string(),
                aggregations_into_value(self.aggregations),
            );
        }
        Value::Object(object)
    }
}

/// Parse the query clauses a `highlight` or `sort` option may carry:
/// `highlight_query` (global or per field) and `nested.filter` of a sort.
fn collect_embedded(key: &str, value: &Value, into: &mut Vec<QueryClause>) -> Result<()> {
    match key {
        "highlight" => {
            let highlight = expect_object(key, value)?;
            if let Some(query) = highlight.get("highlight_query") {
                into.push(QueryClause::parse(query)?);
            }
            let fields: Vec<&Value> = match highlight.get("fields") {
                None => Vec::new(),
                Some(Value::Object(fields)) => fields.values().collect(),
                Some(Value::Array(fields)) => fields
                    .iter()
                    .filter_map(Value::as_object)
                    .flat_map(|field| field.values())
                    .collect(),
                Some(_) => {
                    return Err(malformed(
                        "`highlight.fields` must be an object or a list",
                    ))
                }
            };
            for field in fields {
                if let Some(query) = field.get("highlight_query") {
                    into.push(QueryClause::parse(query)?);
                }
            }
        }
        "sort" => {
            let entries: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for entry in entries.into_iter().filter_map(Value::as_object) {
                for order in entry.values() {
                    let mut level = order.get("nested");
                    while let Some(nested) = level {
                        if let Some(filter) = nested.get("filter") {
                            into.push(QueryClause::parse(filter)?);
                        }
                        level = nested.get("nested");
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// First scripting key found anywhere in `value`.
pub fn find_script_key(value: &Value) -> Option<&str> {
    match value {
        Value::Object(object) => object.iter().find_map(|(key, child)| {
            if SCRIPT_KEYS.contains(&key.as_str()) {
                Some(key.as_str())
            } else {
                find_script_key(child)
            }
        }),
        Value::Array(items) => items.iter().find_map(find_script_key),
        _ => None,
    }
}

fn optional_integer(key: &str, value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        _ => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| malformed(format!("`{key}` must be an integer"))),
    }
}

fn expect_object<'a>(kind: &str, body: &'a Value) -> Result<&'a Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| malformed(format!("`{kind}` body must be an object")))
}

fn malformed(message: impl Into<String>) -> ValidationError {
    ValidationError::Malformed(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bool_accepts_single_clause_and_lists() {
        let clause = QueryClause::parse(&json!({
            "bool": {
                "must": {"match": {"name": "HG00096"}},
                "filter": [{"term": {"sex": "female"}}, {"exists": {"field": "populations"}}],
                "minimum_should_match": 1
            }
        }))
        .unwrap();

        let QueryClause::Bool(query) = &clause else {
            panic!("expected bool clause");
        };
        assert_eq!(query.must.len(), 1);
        assert_eq!(query.filter.len(), 2);
        assert_eq!(query.options.get("minimum_should_match"), Some(&json!(1)));
        assert_eq!(clause.children().len(), 3);
    }

    #[test]
    fn test_parse_rejects_multi_key_clause() {
        let result = QueryClause::parse(&json!({"match_all": {}, "term": {"a": "b"}}));
        assert!(matches!(result, Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn test_nested_round_trip_keeps_options() {
        let original = json!({
            "nested": {
                "path": "populations",
                "score_mode": "avg",
                "query": {"term": {"populations.code": "GBR"}}
            }
        });
        let clause = QueryClause::parse(&original).unwrap();
        assert_eq!(clause.kind(), "nested");
        assert_eq!(clause.into_value(), original);
    }

    #[test]
    fn test_transform_does_not_revisit_replacement() {
        let clause = QueryClause::parse(&json!({
            "bool": {"should": [{"multi_match": {"query": "x"}}]}
        }))
        .unwrap();

        let mut calls = 0;
        let rewritten = clause.transform(&mut |node| {
            calls += 1;
            match node {
                QueryClause::Leaf { kind, body } if kind == "multi_match" => {
                    QueryClause::Bool(BoolQuery {
                        should: vec![QueryClause::Leaf { kind, body }],
                        ..Default::default()
                    })
                }
                other => other,
            }
        });

        assert_eq!(calls, 2);
        assert_eq!(
            rewritten.into_value(),
            json!({"bool": {"should": [{"bool": {"should": [{"multi_match": {"query": "x"}}]}}]}})
        );
    }

    #[test]
    fn test_search_body_rejects_unknown_option() {
        let result = SearchBody::parse(&json!({"query": {"match_all": {}}, "profile": true}));
        assert_eq!(
            result,
            Err(ValidationError::UnsupportedOption("profile".to_string()))
        );
    }

    #[test]
    fn test_search_body_finds_nested_script() {
        let result = SearchBody::parse(&json!({
            "query": {"bool": {"filter": [{"script": {"script": "doc['x'].value > 1"}}]}}
        }));
        assert_eq!(result, Err(ValidationError::Scripting("script".to_string())));
    }

    #[test]
    fn test_filters_aggregation_round_trip() {
        let original = json!({
            "by_sex": {
                "filters": {
                    "filters": {
                        "female": {"term": {"sex": "female"}},
                        "male": {"term": {"sex": "male"}}
                    }
                },
                "aggs": {"pops": {"terms": {"field": "populations.code.keyword", "size": 10}}}
            }
        });
        let aggregations = parse_aggregations(&original).unwrap();
        assert_eq!(aggregations.len(), 1);
        let (_, aggregation) = &aggregations[0];
        assert_eq!(aggregation.kind, "filters");
        assert_eq!(aggregation.clauses().len(), 2);
        assert_eq!(aggregation.sub_aggregations[0].1.requested_size(), Ok(Some(10)));
        assert_eq!(aggregations_into_value(aggregations), original);
    }

    #[test]
    fn test_null_size_is_treated_as_missing() {
        let body = SearchBody::parse(&json!({"size": null})).unwrap();
        assert_eq!(body.size, None);
    }

    #[test]
    fn test_highlight_and_sort_clauses_collected() {
        let body = SearchBody::parse(&json!({
            "highlight": {
                "highlight_query": {"match": {"name": "HG"}},
                "fields": {"description": {"highlight_query": {"fuzzy": {"description": "GBR"}}}}
            },
            "sort": [
                "_score",
                {"populations.code.keyword": {
                    "order": "asc",
                    "nested": {"path": "populations", "filter": {"term": {"populations.code": "GBR"}}}
                }}
            ]
        }))
        .unwrap();

        let kinds: Vec<&str> = body.embedded.iter().map(QueryClause::kind).collect();
        assert_eq!(kinds, vec!["match", "fuzzy", "term"]);
        assert!(body.options.contains_key("highlight"));
        assert!(body.into_value()["sort"].is_array());
    }

    #[test]
    fn test_aggregation_size_must_be_integer() {
        for size in [json!("500000"), json!(10.5), json!(-1)] {
            let aggregations =
                parse_aggregations(&json!({"x": {"terms": {"field": "a", "size": size}}})).unwrap();
            assert!(matches!(
                aggregations[0].1.requested_size(),
                Err(ValidationError::Malformed(_))
            ));
        }

        let aggregations = parse_aggregations(&json!({
            "x": {"terms": {"field": "a", "size": 10, "shard_size": 400}}
        }))
        .unwrap();
        assert_eq!(aggregations[0].1.requested_size(), Ok(Some(400)));
    }
}
