//! Response normalization
//!
//! Turns raw engine responses into [`SearchResponse`] / [`DocumentResponse`].
//! Engine bookkeeping (`_index`, `_score`, `_shards`, `took`, ...) is dropped
//! by construction: only the fields named here are copied.

use igsr_config::Decoration;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::{DocumentResponse, SearchHit, SearchResponse};

/// Aggregation keys with no meaning outside the engine
const AGGREGATION_NOISE: &[&str] = &["doc_count_error_upper_bound", "sum_other_doc_count", "meta"];

/// Engine response did not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("response has no hits object")]
    MissingHits,

    #[error("response has no hits.hits array")]
    MissingHitList,

    #[error("response has no usable hits.total")]
    MissingTotal,

    #[error("hit {0} is not an object")]
    InvalidHit(usize),

    #[error("aggregations is not an object")]
    InvalidAggregations,

    #[error("document has no _source object")]
    MissingSource,
}

/// Raw `hits.hits` entries of a search response
pub fn hit_list(raw: &Value) -> Result<&[Value], NormalizationError> {
    raw.get("hits")
        .filter(|hits| hits.is_object())
        .ok_or(NormalizationError::MissingHits)?
        .get("hits")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(NormalizationError::MissingHitList)
}

fn total_hits(raw: &Value) -> Result<u64, NormalizationError> {
    let total = raw
        .pointer("/hits/total")
        .ok_or(NormalizationError::MissingTotal)?;
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
        .ok_or(NormalizationError::MissingTotal)
}

/// Reshape a search response. At most `page_size` hits are kept.
pub fn normalize_search(
    raw: Value,
    page_size: usize,
    decoration: Option<Decoration>,
) -> Result<SearchResponse, NormalizationError> {
    let raw_hits = hit_list(&raw)?;
    let total = total_hits(&raw)?;

    if raw_hits.len() > page_size {
        warn!(
            returned = raw_hits.len(),
            page_size, "engine returned more hits than requested, truncating"
        );
    }

    let hits = raw_hits
        .iter()
        .take(page_size)
        .enumerate()
        .map(|(position, hit)| normalize_hit(hit, position, decoration))
        .collect::<Result<Vec<_>, _>>()?;

    let aggregations = match raw.get("aggregations") {
        None | Some(Value::Null) => None,
        Some(Value::Object(aggregations)) => Some(normalize_aggregations(aggregations)),
        Some(_) => return Err(NormalizationError::InvalidAggregations),
    };

    Ok(SearchResponse {
        total,
        hits,
        aggregations,
    })
}

fn normalize_hit(
    hit: &Value,
    position: usize,
    decoration: Option<Decoration>,
) -> Result<SearchHit, NormalizationError> {
    let hit = hit
        .as_object()
        .ok_or(NormalizationError::InvalidHit(position))?;

    let mut source = match hit.get("_source") {
        Some(Value::Object(source)) => source.clone(),
        _ => Map::new(),
    };
    if let Some(decoration) = decoration {
        decorate(&mut source, decoration);
    }

    Ok(SearchHit {
        id: hit.get("_id").and_then(Value::as_str).map(str::to_string),
        source,
        highlight: hit.get("highlight").cloned(),
        sort: hit.get("sort").and_then(Value::as_array).cloned(),
    })
}

/// Reshape a document GET response, dropping blank `prune_fields`.
pub fn normalize_document(
    raw: Value,
    prune_fields: &[String],
    decoration: Option<Decoration>,
) -> Result<DocumentResponse, NormalizationError> {
    let id = raw.get("_id").and_then(Value::as_str).map(str::to_string);
    let source = match raw.get("_source") {
        Some(Value::Object(source)) => source.clone(),
        _ => return Err(NormalizationError::MissingSource),
    };
    Ok(document(id, source, prune_fields, decoration))
}

/// Turn an already normalized hit into a detail document.
pub fn document_from_hit(
    hit: SearchHit,
    prune_fields: &[String],
    decoration: Option<Decoration>,
) -> DocumentResponse {
    document(hit.id, hit.source, prune_fields, decoration)
}

fn document(
    id: Option<String>,
    mut source: Map<String, Value>,
    prune_fields: &[String],
    decoration: Option<Decoration>,
) -> DocumentResponse {
    for field in prune_fields {
        if source.get(field).is_some_and(is_blank) {
            source.remove(field);
        }
    }
    if let Some(decoration) = decoration {
        decorate(&mut source, decoration);
    }
    DocumentResponse { id, source }
}

/// Null, whitespace-only string, empty object, or a list of blanks
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub fn decorate(source: &mut Map<String, Value>, decoration: Decoration) {
    match decoration {
        Decoration::HumanLabel => {
            let label = ["description", "title", "shortTitle", "code"]
                .iter()
                .filter_map(|key| source.get(*key).and_then(Value::as_str))
                .find(|text| !text.is_empty())
                .unwrap_or_default()
                .to_string();

            if source.get("title").map_or(true, is_blank) {
                source.insert("title".to_string(), Value::String(label.clone()));
            }
            source.insert("shortTitle".to_string(), Value::String(label));
        }
    }
}

fn normalize_aggregations(aggregations: &Map<String, Value>) -> Value {
    Value::Object(
        aggregations
            .iter()
            .map(|(name, aggregation)| (name.clone(), normalize_aggregation(aggregation)))
            .collect(),
    )
}

/// Buckets become `{key, count, ..sub-aggregations}`; metric values pass through.
fn normalize_aggregation(value: &Value) -> Value {
    let Value::Object(fields) = value else {
        return value.clone();
    };

    let mut normalized = Map::new();
    for (key, field) in fields {
        if AGGREGATION_NOISE.contains(&key.as_str()) {
            continue;
        }
        match (key.as_str(), field) {
            ("doc_count", _) => {
                normalized.insert("count".to_string(), field.clone());
            }
            ("buckets", Value::Array(buckets)) => {
                normalized.insert(
                    "buckets".to_string(),
                    Value::Array(buckets.iter().map(normalize_aggregation).collect()),
                );
            }
            ("buckets", Value::Object(keyed)) => {
                let buckets = keyed
                    .iter()
                    .map(|(bucket_key, bucket)| {
                        let mut bucket = normalize_aggregation(bucket);
                        if let Value::Object(bucket) = &mut bucket {
                            bucket
                                .entry("key")
                                .or_insert_with(|| Value::String(bucket_key.clone()));
                        }
                        bucket
                    })
                    .collect();
                normalized.insert("buckets".to_string(), Value::Array(buckets));
            }
            (_, Value::Object(_)) => {
                normalized.insert(key.clone(), normalize_aggregation(field));
            }
            _ => {
                normalized.insert(key.clone(), field.clone());
            }
        }
    }
    Value::Object(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(hits: Vec<Value>, total: Value) -> Value {
        json!({
            "took": 4,
            "timed_out": false,
            "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0},
            "hits": {"total": total, "max_score": 1.0, "hits": hits}
        })
    }

    fn hit(id: &str) -> Value {
        json!({
            "_index": "sample",
            "_id": id,
            "_score": 1.0,
            "_source": {"name": id, "sex": "female"}
        })
    }

    #[test]
    fn test_three_hits_preserve_order() {
        let raw = fixture(
            vec![hit("HG00096"), hit("HG00097"), hit("HG00099")],
            json!({"value": 3, "relation": "eq"}),
        );
        let response = normalize_search(raw, 10, None).unwrap();

        assert_eq!(response.total, 3);
        assert_eq!(response.hits.len(), 3);
        let ids: Vec<_> = response
            .hits
            .iter()
            .map(|hit| hit.id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["HG00096", "HG00097", "HG00099"]);
    }

    #[test]
    fn test_bookkeeping_stripped() {
        let raw = fixture(vec![hit("HG00096")], json!(1));
        let serialized = serde_json::to_value(normalize_search(raw, 10, None).unwrap()).unwrap();

        assert_eq!(
            serialized,
            json!({
                "total": 1,
                "hits": [{"id": "HG00096", "source": {"name": "HG00096", "sex": "female"}}]
            })
        );
    }

    #[test]
    fn test_hits_truncated_to_page_size() {
        let raw = fixture(vec![hit("a"), hit("b"), hit("c")], json!(3));
        let response = normalize_search(raw, 2, None).unwrap();
        assert_eq!(response.total, 3);
        assert_eq!(response.hits.len(), 2);
    }

    #[test]
    fn test_highlight_and_sort_kept() {
        let mut raw_hit = hit("HG00096");
        raw_hit["highlight"] = json!({"name": ["<em>HG00096</em>"]});
        raw_hit["sort"] = json!(["HG00096", 7]);
        let response = normalize_search(fixture(vec![raw_hit], json!(1)), 10, None).unwrap();

        assert_eq!(response.hits[0].sort, Some(vec![json!("HG00096"), json!(7)]));
        assert!(response.hits[0].highlight.is_some());
    }

    #[test]
    fn test_missing_shapes_rejected() {
        assert_eq!(
            normalize_search(json!({"took": 1}), 10, None),
            Err(NormalizationError::MissingHits)
        );
        assert_eq!(
            normalize_search(json!({"hits": {"total": 0}}), 10, None),
            Err(NormalizationError::MissingHitList)
        );
        assert_eq!(
            normalize_search(json!({"hits": {"hits": []}}), 10, None),
            Err(NormalizationError::MissingTotal)
        );
        assert_eq!(
            normalize_search(fixture(vec![json!("oops")], json!(1)), 10, None),
            Err(NormalizationError::InvalidHit(0))
        );
    }

    #[test]
    fn test_terms_buckets_normalized() {
        let mut raw = fixture(vec![], json!(0));
        raw["aggregations"] = json!({
            "populations": {
                "doc_count_error_upper_bound": 0,
                "sum_other_doc_count": 12,
                "buckets": [
                    {"key": "GBR", "doc_count": 91, "sexes": {"buckets": [{"key": "female", "doc_count": 47}]}},
                    {"key": "FIN", "doc_count": 99}
                ]
            },
            "max_year": {"value": 2015.0}
        });
        let response = normalize_search(raw, 10, None).unwrap();

        assert_eq!(
            response.aggregations.unwrap(),
            json!({
                "populations": {
                    "buckets": [
                        {"key": "GBR", "count": 91, "sexes": {"buckets": [{"key": "female", "count": 47}]}},
                        {"key": "FIN", "count": 99}
                    ]
                },
                "max_year": {"value": 2015.0}
            })
        );
    }

    #[test]
    fn test_keyed_and_single_bucket_aggregations() {
        let mut raw = fixture(vec![], json!(0));
        raw["aggregations"] = json!({
            "phase": {"buckets": {"phase1": {"doc_count": 3}, "phase3": {"doc_count": 5}}},
            "with_cram": {"doc_count": 8, "meta": {"ui": "x"}}
        });
        let aggregations = normalize_search(raw, 10, None).unwrap().aggregations.unwrap();

        assert_eq!(
            aggregations["phase"]["buckets"],
            json!([{"key": "phase1", "count": 3}, {"key": "phase3", "count": 5}])
        );
        assert_eq!(aggregations["with_cram"], json!({"count": 8}));
    }

    #[test]
    fn test_document_prunes_blank_fields() {
        let raw = json!({
            "_index": "sample",
            "_id": "HG00096",
            "found": true,
            "_source": {"name": "HG00096", "sharedSamples": [], "populations": [{"code": "GBR"}]}
        });
        let document = normalize_document(raw, &["sharedSamples".to_string()], None).unwrap();

        assert_eq!(document.id.as_deref(), Some("HG00096"));
        assert!(!document.source.contains_key("sharedSamples"));
        assert!(document.source.contains_key("populations"));
    }

    #[test]
    fn test_blank_values() {
        let blanks = [
            json!(null),
            json!(""),
            json!("  \t"),
            json!([]),
            json!([null, "", " "]),
            json!({}),
            json!([{}]),
        ];
        for value in blanks {
            assert!(is_blank(&value), "{value}");
        }
        for value in [json!(0), json!(false), json!("GBR"), json!([null, "GBR"])] {
            assert!(!is_blank(&value), "{value}");
        }
    }

    #[test]
    fn test_prune_drops_lists_of_blanks() {
        let raw = json!({"_id": "HG00096", "_source": {"sharedSamples": [null, ""], "name": "  "}});
        let prune = ["sharedSamples".to_string(), "name".to_string()];
        let document = normalize_document(raw, &prune, None).unwrap();
        assert!(document.source.is_empty());
    }

    #[test]
    fn test_prune_keeps_non_blank_fields() {
        let raw = json!({"_id": "GBR", "_source": {"overlappingPopulations": [{"code": "CEU"}]}});
        let document =
            normalize_document(raw, &["overlappingPopulations".to_string()], None).unwrap();
        assert!(document.source.contains_key("overlappingPopulations"));
    }

    #[test]
    fn test_human_label_decoration() {
        let mut source = json!({"code": "PUR", "title": "", "description": "Puerto Rican"})
            .as_object()
            .cloned()
            .unwrap();
        decorate(&mut source, Decoration::HumanLabel);
        assert_eq!(source["shortTitle"], "Puerto Rican");
        assert_eq!(source["title"], "Puerto Rican");

        let mut source = json!({"code": "ACB", "title": "African Caribbean"})
            .as_object()
            .cloned()
            .unwrap();
        decorate(&mut source, Decoration::HumanLabel);
        assert_eq!(source["shortTitle"], "African Caribbean");
        assert_eq!(source["title"], "African Caribbean");

        let mut source = Map::new();
        decorate(&mut source, Decoration::HumanLabel);
        assert_eq!(source["shortTitle"], "");
    }
}
