//! Query validation against a [`QueryPolicy`]
//!
//! Validation is a pure function of the policy and the body: the same
//! input always produces the same decision and nothing here touches the
//! network.

use serde_json::Value;

use crate::{
    ast::{Aggregation, ClauseVisitor, QueryClause, SearchBody},
    error::{Result, ValidationError},
    policy::QueryPolicy,
};

/// Page size sentinel the frontend uses for "everything".
pub const ALL_RESULTS: i64 = -1;

/// A search body that passed validation, with its page bounds resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSearch {
    body: SearchBody,
    page_size: usize,
    from: usize,
}

impl ValidatedSearch {
    /// Number of hits the engine will be asked for
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Offset of the first hit
    pub fn from(&self) -> usize {
        self.from
    }

    pub fn body(&self) -> &SearchBody {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut SearchBody {
        &mut self.body
    }

    /// Requested `_source` field list, when the caller sent one as an array.
    pub fn source_fields(&self) -> Option<Vec<String>> {
        self.body
            .options
            .get("_source")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|field| field.as_str().map(str::to_string))
                    .collect()
            })
    }

    /// Insert a default `_source` list when the caller did not choose one.
    pub fn ensure_source(&mut self, fields: &[String]) {
        if fields.is_empty() {
            return;
        }
        self.body
            .options
            .entry("_source")
            .or_insert_with(|| Value::from(fields.to_vec()));
    }

    /// Final body sent to the engine. Total hit counting is always on:
    /// without it the engine omits `hits.total`.
    pub fn into_engine_body(self) -> Value {
        let mut body = self.body;
        body.size = Some(self.page_size as i64);
        body.options
            .insert("track_total_hits".to_string(), Value::Bool(true));
        body.into_value()
    }
}

/// Checks inbound bodies against an allow-list policy.
#[derive(Debug, Clone)]
pub struct QueryValidator {
    policy: QueryPolicy,
}

impl QueryValidator {
    pub fn new(policy: QueryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Validate with the policy page size bound.
    pub fn validate(&self, value: &Value) -> Result<ValidatedSearch> {
        self.validate_with_page_limit(value, self.policy.max_page_size)
    }

    /// Validate with a different page size bound (used by exports).
    pub fn validate_with_page_limit(
        &self,
        value: &Value,
        page_limit: usize,
    ) -> Result<ValidatedSearch> {
        let body = SearchBody::parse(value)?;

        let mut visitor = AllowListVisitor {
            policy: &self.policy,
        };
        for clause in body
            .query
            .iter()
            .chain(body.post_filter.iter())
            .chain(body.embedded.iter())
        {
            clause.accept(&mut visitor)?;
        }
        for (name, aggregation) in &body.aggregations {
            self.check_aggregation(name, aggregation, &mut visitor)?;
        }

        let page_size = resolve_page_size(body.size, page_limit)?;
        let from = match body.from {
            None => 0,
            Some(from) if from < 0 => return Err(ValidationError::NegativeOffset(from)),
            Some(from) => from as usize,
        };

        let window = from as u64 + page_size as u64;
        if window > self.policy.max_result_window as u64 {
            return Err(ValidationError::WindowTooLarge {
                window,
                max: self.policy.max_result_window,
            });
        }

        Ok(ValidatedSearch {
            body,
            page_size,
            from,
        })
    }

    fn check_aggregation(
        &self,
        name: &str,
        aggregation: &Aggregation,
        visitor: &mut AllowListVisitor<'_>,
    ) -> Result<()> {
        if !self.policy.allows_aggregation(&aggregation.kind) {
            return Err(ValidationError::ForbiddenAggregation(
                aggregation.kind.clone(),
            ));
        }

        if let Some(size) = aggregation.requested_size()? {
            if size > self.policy.max_aggregation_size as u64 {
                return Err(ValidationError::AggregationTooLarge {
                    name: name.to_string(),
                    size,
                    max: self.policy.max_aggregation_size,
                });
            }
        }

        for clause in aggregation.clauses() {
            clause.accept(visitor)?;
        }
        for (sub_name, sub) in &aggregation.sub_aggregations {
            self.check_aggregation(sub_name, sub, visitor)?;
        }
        Ok(())
    }
}

/// Resolve the requested page size against `max`.
pub fn resolve_page_size(size: Option<i64>, max: usize) -> Result<usize> {
    match size {
        None | Some(ALL_RESULTS) => Ok(max),
        Some(size) if size < 0 => Err(ValidationError::NegativePageSize(size)),
        Some(size) if size as u64 > max as u64 => {
            Err(ValidationError::PageSizeTooLarge { size, max })
        }
        Some(size) => Ok(size as usize),
    }
}

struct AllowListVisitor<'a> {
    policy: &'a QueryPolicy,
}

impl ClauseVisitor for AllowListVisitor<'_> {
    type Error = ValidationError;

    fn visit(&mut self, clause: &QueryClause, depth: usize) -> Result<()> {
        if depth > self.policy.max_depth {
            return Err(ValidationError::TooDeep(self.policy.max_depth));
        }

        let kind = clause.kind();
        if !self.policy.allows_clause(kind) {
            return Err(ValidationError::ForbiddenClause(kind.to_string()));
        }

        if let QueryClause::Leaf { kind, body } = clause {
            if kind == "terms" {
                let lookup = body
                    .as_object()
                    .map(|fields| {
                        fields
                            .iter()
                            .any(|(field, values)| field != "boost" && values.is_object())
                    })
                    .unwrap_or(false);
                if lookup {
                    return Err(ValidationError::TermsLookup);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> QueryValidator {
        QueryValidator::new(QueryPolicy::default())
    }

    #[test]
    fn test_missing_size_uses_maximum() {
        let search = validator()
            .validate(&json!({"query": {"match_all": {}}}))
            .unwrap();
        assert_eq!(search.page_size(), 100);
        assert_eq!(search.from(), 0);
    }

    #[test]
    fn test_all_results_sentinel_is_capped() {
        let search = validator().validate(&json!({"size": -1})).unwrap();
        assert_eq!(search.page_size(), 100);
    }

    #[test]
    fn test_oversized_page_rejected() {
        let result = validator().validate(&json!({"size": 101}));
        assert_eq!(
            result,
            Err(ValidationError::PageSizeTooLarge { size: 101, max: 100 })
        );
    }

    #[test]
    fn test_negative_page_and_offset_rejected() {
        assert_eq!(
            validator().validate(&json!({"size": -5})),
            Err(ValidationError::NegativePageSize(-5))
        );
        assert_eq!(
            validator().validate(&json!({"size": 5, "from": -1})),
            Err(ValidationError::NegativeOffset(-1))
        );
    }

    #[test]
    fn test_result_window_bound() {
        let result = validator().validate(&json!({"size": 100, "from": 9_901}));
        assert_eq!(
            result,
            Err(ValidationError::WindowTooLarge {
                window: 10_001,
                max: 10_000
            })
        );
        assert!(validator()
            .validate(&json!({"size": 100, "from": 9_900}))
            .is_ok());
    }

    #[test]
    fn test_forbidden_clause_anywhere_in_tree() {
        let result = validator().validate(&json!({
            "query": {"bool": {"must": [{"nested": {
                "path": "populations",
                "query": {"more_like_this": {"like": "GBR"}}
            }}]}}
        }));
        assert_eq!(
            result,
            Err(ValidationError::ForbiddenClause("more_like_this".to_string()))
        );
    }

    #[test]
    fn test_compound_kinds_follow_allow_list() {
        let validator = QueryValidator::new(QueryPolicy::default().with_clauses(["match_all"]));
        let result = validator.validate(&json!({"query": {"bool": {"must": {"match_all": {}}}}}));
        assert_eq!(result, Err(ValidationError::ForbiddenClause("bool".to_string())));
    }

    #[test]
    fn test_post_filter_is_checked() {
        let result = validator().validate(&json!({"post_filter": {"percolate": {"field": "q"}}}));
        assert_eq!(
            result,
            Err(ValidationError::ForbiddenClause("percolate".to_string()))
        );
    }

    #[test]
    fn test_depth_bound() {
        let mut query = json!({"match_all": {}});
        for _ in 0..20 {
            query = json!({"bool": {"must": [query]}});
        }
        let result = validator().validate(&json!({"query": query}));
        assert_eq!(result, Err(ValidationError::TooDeep(16)));
    }

    #[test]
    fn test_terms_lookup_rejected() {
        let result = validator().validate(&json!({
            "query": {"terms": {"name": {"index": "users", "id": "1", "path": "names"}}}
        }));
        assert_eq!(result, Err(ValidationError::TermsLookup));

        assert!(validator()
            .validate(&json!({"query": {"terms": {"name": ["HG00096"], "boost": 1.0}}}))
            .is_ok());
    }

    #[test]
    fn test_aggregation_rules() {
        let forbidden = validator().validate(&json!({
            "aggs": {"x": {"significant_text": {"field": "description"}}}
        }));
        assert_eq!(
            forbidden,
            Err(ValidationError::ForbiddenAggregation("significant_text".to_string()))
        );

        let too_large = validator().validate(&json!({
            "aggs": {"pops": {"terms": {"field": "populations.code.keyword", "size": 5000}}}
        }));
        assert!(matches!(
            too_large,
            Err(ValidationError::AggregationTooLarge { size: 5000, .. })
        ));

        let nested_filter = validator().validate(&json!({
            "aggs": {"f": {"filter": {"fuzzy": {"name": "HG"}}}}
        }));
        assert_eq!(
            nested_filter,
            Err(ValidationError::ForbiddenClause("fuzzy".to_string()))
        );
    }

    #[test]
    fn test_engine_body_defaults() {
        let search = validator()
            .validate(&json!({"query": {"match_all": {}}, "size": 1}))
            .unwrap();
        assert_eq!(
            search.into_engine_body(),
            json!({"query": {"match_all": {}}, "size": 1, "track_total_hits": true})
        );
    }

    #[test]
    fn test_engine_body_keeps_explicit_source() {
        let mut search = validator()
            .validate(&json!({"_source": ["name"], "from": 10}))
            .unwrap();
        search.ensure_source(&["url".to_string()]);
        assert_eq!(search.source_fields(), Some(vec!["name".to_string()]));
        assert_eq!(
            search.into_engine_body(),
            json!({"_source": ["name"], "from": 10, "size": 100, "track_total_hits": true})
        );
    }

    #[test]
    fn test_total_hit_counting_cannot_be_disabled() {
        for value in [json!(false), json!(100)] {
            let search = validator()
                .validate(&json!({"query": {"match_all": {}}, "size": 1, "track_total_hits": value}))
                .unwrap();
            assert_eq!(search.into_engine_body()["track_total_hits"], true);
        }
    }

    #[test]
    fn test_highlight_query_is_checked() {
        let result = validator().validate(&json!({
            "query": {"match_all": {}},
            "highlight": {
                "fields": {"name": {}},
                "highlight_query": {"more_like_this": {"like": "x"}}
            }
        }));
        assert_eq!(
            result,
            Err(ValidationError::ForbiddenClause("more_like_this".to_string()))
        );

        let per_field = validator().validate(&json!({
            "highlight": {"fields": [{"name": {"highlight_query": {"fuzzy": {"name": "HG"}}}}]}
        }));
        assert_eq!(
            per_field,
            Err(ValidationError::ForbiddenClause("fuzzy".to_string()))
        );

        assert!(validator()
            .validate(&json!({"highlight": {"fields": {"name": {}}}}))
            .is_ok());
    }

    #[test]
    fn test_sort_nested_filter_is_checked() {
        let result = validator().validate(&json!({
            "sort": [{"populations.code.keyword": {
                "nested": {"path": "populations", "filter": {"fuzzy": {"populations.code": "GB"}}}
            }}]
        }));
        assert_eq!(result, Err(ValidationError::ForbiddenClause("fuzzy".to_string())));

        assert!(validator()
            .validate(&json!({"sort": [{"populations.code.keyword": {
                "order": "asc",
                "nested": {"path": "populations", "filter": {"term": {"populations.code": "GBR"}}}
            }}, "_score"]}))
            .is_ok());
    }

    #[test]
    fn test_aggregation_size_as_string_rejected() {
        let result = validator().validate(&json!({
            "aggs": {"x": {"terms": {"field": "a", "size": "500000"}}}
        }));
        assert!(matches!(result, Err(ValidationError::Malformed(_))));

        let shard = validator().validate(&json!({
            "aggs": {"x": {"terms": {"field": "a", "size": 10, "shard_size": 50000}}}
        }));
        assert!(matches!(
            shard,
            Err(ValidationError::AggregationTooLarge { size: 50000, .. })
        ));
    }

    #[test]
    fn test_export_limit() {
        let search = validator()
            .validate_with_page_limit(&json!({"size": -1}), 5_000)
            .unwrap();
        assert_eq!(search.page_size(), 5_000);
    }
}
