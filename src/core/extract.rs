use crate::models::{Criterion, CriterionKind};
use serde_json::Value;

/// Normalize a scalar JSON value into a match key: trimmed, lowercased.
/// Containers and nulls normalize to the empty string and are dropped by
/// callers.
pub fn normalize(value: &Value) -> String {
    match value {
        Value::String(s) => normalize_str(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[inline]
pub fn normalize_str(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Strip markup tags and collapse runs of whitespace into single spaces.
pub fn strip_markup(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => {
                in_tag = true;
                cleaned.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => cleaned.push(ch),
            _ => {}
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Coerce a resolved value to a number for range comparison. Failure is
/// "no value", never an error.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerce a present value to a boolean. Unrecognized shapes are treated as
/// absent so extraction stays total over malformed data.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match normalize_str(s).as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug)]
struct PathSegment<'a> {
    key: &'a str,
    index: Option<usize>,
}

fn parse_segment(segment: &str) -> PathSegment<'_> {
    if let (Some(open), true) = (segment.find('['), segment.ends_with(']')) {
        if let Ok(index) = segment[open + 1..segment.len() - 1].parse::<usize>() {
            return PathSegment {
                key: &segment[..open],
                index: Some(index),
            };
        }
    }
    PathSegment {
        key: segment,
        index: None,
    }
}

/// Resolve a dot-separated path (with optional bracket indexes, e.g.
/// `photos[0].url`) against an arbitrarily nested item record.
///
/// Resolving through an array without an index projects the remaining path
/// across every element. Any missing, null or shape-mismatched intermediate
/// resolves to `None` — never an error.
pub fn resolve_path(item: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let segments: Vec<PathSegment<'_>> = path.split('.').map(parse_segment).collect();
    resolve_segments(item, &segments).filter(|value| !value.is_null())
}

fn resolve_segments(value: &Value, segments: &[PathSegment<'_>]) -> Option<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    match value {
        Value::Object(map) => {
            let mut inner = map.get(segment.key)?;
            if let Some(index) = segment.index {
                inner = inner.as_array()?.get(index)?;
            }
            if inner.is_null() {
                return None;
            }
            resolve_segments(inner, rest)
        }
        // Unindexed array: project the remaining path across every element.
        Value::Array(entries) => {
            let projected: Vec<Value> = entries
                .iter()
                .filter_map(|entry| resolve_segments(entry, segments))
                .filter(|resolved| !resolved.is_null())
                .collect();
            if projected.is_empty() {
                None
            } else {
                Some(Value::Array(projected))
            }
        }
        _ => None,
    }
}

#[inline]
fn token(section_key: &str, value: &str) -> String {
    format!("{}:{}", section_key, value)
}

/// Derive the normalized match tokens an item produces for one criterion.
///
/// Range criteria never tokenize (the scorer compares bounds directly) and
/// free-text criteria go through [`extract_text_tokens`] instead.
pub fn extract_tokens(item: &Value, section_key: &str, criterion: &Criterion) -> Vec<String> {
    let Some(path) = criterion.path.as_deref() else {
        return Vec::new();
    };
    let Some(resolved) = resolve_path(item, path) else {
        return Vec::new();
    };

    match criterion.kind {
        CriterionKind::CategoricalMulti | CriterionKind::CategoricalSingle => {
            categorical_tokens(section_key, &resolved)
        }
        CriterionKind::Boolean => coerce_bool(&resolved)
            .map(|flag| vec![token(section_key, &flag.to_string())])
            .unwrap_or_default(),
        CriterionKind::NumericRange | CriterionKind::FreeText => Vec::new(),
    }
}

fn categorical_tokens(section_key: &str, resolved: &Value) -> Vec<String> {
    match resolved {
        Value::Array(entries) => entries
            .iter()
            .map(normalize)
            .filter(|value| !value.is_empty())
            .map(|value| token(section_key, &value))
            .collect(),
        scalar => {
            let value = normalize(scalar);
            if value.is_empty() {
                Vec::new()
            } else {
                vec![token(section_key, &value)]
            }
        }
    }
}

/// Free-text matching: the resolved value must be a string; the haystack is
/// tag-stripped, whitespace-collapsed and lowercased, and each selected term
/// that it contains as a substring emits a token.
pub fn extract_text_tokens(
    item: &Value,
    section_key: &str,
    criterion: &Criterion,
    terms: &[String],
) -> Vec<String> {
    if terms.is_empty() {
        return Vec::new();
    }
    let Some(path) = criterion.path.as_deref() else {
        return Vec::new();
    };
    let Some(Value::String(raw)) = resolve_path(item, path) else {
        return Vec::new();
    };
    let haystack = normalize_str(&strip_markup(&raw));

    terms
        .iter()
        .filter(|term| !term.is_empty() && haystack.contains(term.as_str()))
        .map(|term| token(section_key, term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criterion(key: &str, kind: CriterionKind, path: &str) -> Criterion {
        Criterion {
            key: key.to_string(),
            label: key.to_string(),
            kind,
            path: Some(path.to_string()),
            options: None,
            allow_custom_value: false,
        }
    }

    #[test]
    fn test_resolve_simple_path() {
        let item = json!({"specs": {"color": "Sunburst"}});
        assert_eq!(
            resolve_path(&item, "specs.color"),
            Some(json!("Sunburst"))
        );
    }

    #[test]
    fn test_resolve_bracket_index() {
        let item = json!({"photos": [{"url": "a.jpg"}, {"url": "b.jpg"}]});
        assert_eq!(resolve_path(&item, "photos[1].url"), Some(json!("b.jpg")));
        assert_eq!(resolve_path(&item, "photos[9].url"), None);
    }

    #[test]
    fn test_resolve_projects_across_arrays() {
        let item = json!({"offers": [{"seller": "alpha"}, {"seller": "beta"}, {"note": 1}]});
        assert_eq!(
            resolve_path(&item, "offers.seller"),
            Some(json!(["alpha", "beta"]))
        );
    }

    #[test]
    fn test_resolve_malformed_is_none() {
        let item = json!({"price": 300});
        assert_eq!(resolve_path(&item, "price.amount"), None);
        assert_eq!(resolve_path(&item, "missing.deeply.nested"), None);
        assert_eq!(resolve_path(&json!(null), "anything"), None);
    }

    #[test]
    fn test_categorical_tokens_from_list_and_scalar() {
        let spec = criterion("brand", CriterionKind::CategoricalMulti, "brands");
        let item = json!({"brands": ["Acme", "  Zonko  ", ""]});
        assert_eq!(
            extract_tokens(&item, "brand", &spec),
            vec!["brand:acme", "brand:zonko"]
        );

        let single = criterion("condition", CriterionKind::CategoricalSingle, "condition");
        let item = json!({"condition": "Mint"});
        assert_eq!(
            extract_tokens(&item, "condition", &single),
            vec!["condition:mint"]
        );
    }

    #[test]
    fn test_boolean_tokens_only_when_present() {
        let spec = criterion("in_stock", CriterionKind::Boolean, "in_stock");

        let present = json!({"in_stock": false});
        assert_eq!(
            extract_tokens(&present, "in_stock", &spec),
            vec!["in_stock:false"]
        );

        let absent = json!({"other": true});
        assert!(extract_tokens(&absent, "in_stock", &spec).is_empty());

        let null = json!({"in_stock": null});
        assert!(extract_tokens(&null, "in_stock", &spec).is_empty());
    }

    #[test]
    fn test_range_never_tokenizes() {
        let spec = criterion("price", CriterionKind::NumericRange, "price");
        let item = json!({"price": 300});
        assert!(extract_tokens(&item, "price", &spec).is_empty());
    }

    #[test]
    fn test_text_tokens_case_insensitive_substring() {
        let spec = criterion("notes", CriterionKind::FreeText, "description");
        let item = json!({"description": "<b>Vintage  Sunburst</b> Finish"});

        let hits = extract_text_tokens(
            &item,
            "notes",
            &spec,
            &["sunburst".to_string(), "sun burst".to_string()],
        );
        assert_eq!(hits, vec!["notes:sunburst"]);
    }

    #[test]
    fn test_strip_markup_collapses_whitespace() {
        assert_eq!(
            strip_markup("<p>Vintage   <em>Sunburst</em>\nFinish</p>"),
            "Vintage Sunburst Finish"
        );
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(42)), Some(42.0));
        assert_eq!(coerce_number(&json!(" 19.5 ")), Some(19.5));
        assert_eq!(coerce_number(&json!("n/a")), None);
        assert_eq!(coerce_number(&json!(["10"])), None);
    }
}
