//! TSV rendering for search downloads

use serde_json::Value;

/// Separator between list items inside one cell
const LIST_SEPARATOR: &str = ",";

/// Resolve a dotted path through a document.
///
/// A list of objects met along the way fans out: the next segment is read
/// from every element and blank values are dropped.
pub fn get_nested(source: &Value, path: &str) -> Value {
    let mut current = source.clone();
    for segment in path.split('.') {
        current = match current {
            Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Null),
            Value::Array(items) => {
                let mut collected = Vec::new();
                for item in items {
                    let Value::Object(mut item) = item else {
                        continue;
                    };
                    match item.remove(segment) {
                        Some(Value::Array(values)) => {
                            collected.extend(values.into_iter().filter(|v| !is_empty_cell(v)))
                        }
                        Some(value) if !is_empty_cell(&value) => collected.push(value),
                        _ => {}
                    }
                }
                Value::Array(collected)
            }
            _ => return Value::Null,
        };
    }
    current
}

fn is_empty_cell(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format one value as a single TSV cell.
pub fn to_tsv_cell(value: &Value) -> String {
    let text = match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !is_empty_cell(item))
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        other => scalar_text(other),
    };
    text.replace(['\t', '\r', '\n'], " ")
}

/// One TSV line for a raw engine hit. `_id` and `_index` come from the hit,
/// everything else from `_source`.
pub fn hit_row(hit: &Value, columns: &[String]) -> String {
    let empty = Value::Null;
    let source = hit.get("_source").unwrap_or(&empty);

    columns
        .iter()
        .map(|column| {
            let value = match column.as_str() {
                "_id" | "_index" => hit.get(column).cloned().unwrap_or(Value::Null),
                path => get_nested(source, path),
            };
            to_tsv_cell(&value)
        })
        .collect::<Vec<_>>()
        .join("\t")
}

/// Header row plus one row per hit, newline terminated.
pub fn render_tsv(columns: &[String], hits: &[Value]) -> String {
    let mut out = columns
        .iter()
        .map(|column| to_tsv_cell(&Value::String(column.clone())))
        .collect::<Vec<_>>()
        .join("\t");
    out.push('\n');

    for hit in hits {
        out.push_str(&hit_row(hit, columns));
        out.push('\n');
    }
    out
}

/// Restrict a download name to characters safe inside a quoted header value.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "export".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_get_nested_through_objects() {
        let source = json!({"superpopulation": {"name": "European Ancestry"}});
        assert_eq!(
            get_nested(&source, "superpopulation.name"),
            json!("European Ancestry")
        );
        assert_eq!(get_nested(&source, "superpopulation.code"), Value::Null);
        assert_eq!(get_nested(&source, "superpopulation.name.x"), Value::Null);
    }

    #[test]
    fn test_get_nested_fans_out_over_lists() {
        let source = json!({
            "populations": [
                {"code": "GBR", "dataCollections": ["1000 Genomes", ""]},
                {"code": ""},
                {"code": "FIN", "dataCollections": ["HGDP"]},
                "stray"
            ]
        });
        assert_eq!(get_nested(&source, "populations.code"), json!(["GBR", "FIN"]));
        assert_eq!(
            get_nested(&source, "populations.dataCollections"),
            json!(["1000 Genomes", "HGDP"])
        );
    }

    #[test]
    fn test_cell_formatting() {
        assert_eq!(to_tsv_cell(&Value::Null), "");
        assert_eq!(to_tsv_cell(&json!("HG00096")), "HG00096");
        assert_eq!(to_tsv_cell(&json!(51.5)), "51.5");
        assert_eq!(to_tsv_cell(&json!(["a", "", null, "b"])), "a,b");
        assert_eq!(to_tsv_cell(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(to_tsv_cell(&json!([{"a": 1}, 2])), r#"{"a":1},2"#);
        assert_eq!(to_tsv_cell(&json!("line\tone\nline two")), "line one line two");
    }

    #[test]
    fn test_render_rows() {
        let hits = vec![
            json!({"_id": "HG00096", "_index": "sample", "_source": {"name": "HG00096", "sex": "male"}}),
            json!({"_id": "HG00097", "_source": {"name": "HG00097"}}),
        ];
        let tsv = render_tsv(&columns(&["_id", "name", "sex"]), &hits);
        assert_eq!(tsv, "_id\tname\tsex\nHG00096\tHG00096\tmale\nHG00097\tHG00097\t\n");
    }

    #[test]
    fn test_render_without_hits_is_header_only() {
        assert_eq!(render_tsv(&columns(&["url", "md5"]), &[]), "url\tmd5\n");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("igsr-samples_2024"), "igsr-samples_2024");
        assert_eq!(sanitize_filename("a\"b;c"), "a_b_c");
        assert_eq!(sanitize_filename(".."), "export");
        assert_eq!(sanitize_filename(""), "export");
    }
}
