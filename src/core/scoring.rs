use crate::core::extract::{coerce_number, extract_text_tokens, extract_tokens, normalize_str, resolve_path};
use crate::core::spec::parse_search_term_key;
use crate::models::{Criterion, CriterionKind, PrioritySpec, ScoredItem};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Compute per-item score breakdowns against the active priority spec.
///
/// Extraction is restricted to sections present in the spec, bounding the
/// work to relevant criteria. The computation is pure: items are read-only
/// and each call starts from a fresh token set, so any state change simply
/// recomputes everything.
pub fn score_items(
    items: &[Value],
    spec: &PrioritySpec,
    criteria: &[Criterion],
) -> Vec<ScoredItem> {
    let by_key: HashMap<String, &Criterion> = criteria
        .iter()
        .map(|criterion| (normalize_str(&criterion.key), criterion))
        .collect();

    // Split the active sections into exact-token criteria and free-text
    // criteria; synthetic per-term keys resolve through their base criterion.
    let mut token_sections: Vec<(&String, &Criterion)> = Vec::new();
    let mut text_sections: Vec<(&String, &Criterion)> = Vec::new();
    for section_key in &spec.sections {
        let parsed = parse_search_term_key(section_key);
        let lookup = parsed
            .as_ref()
            .map(|key| normalize_str(&key.base_key))
            .unwrap_or_else(|| section_key.clone());
        let Some(criterion) = by_key.get(&lookup).copied() else {
            continue;
        };
        if parsed.is_some() || criterion.is_text() {
            text_sections.push((section_key, criterion));
        } else if criterion.kind != CriterionKind::NumericRange {
            token_sections.push((section_key, criterion));
        }
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut item_tokens: HashSet<String> = HashSet::new();
            for (section_key, criterion) in &token_sections {
                item_tokens.extend(extract_tokens(item, section_key, criterion));
            }
            for (section_key, criterion) in &text_sections {
                if let Some(terms) = spec.values_by_section.get(*section_key) {
                    item_tokens.extend(extract_text_tokens(item, section_key, criterion, terms));
                }
            }

            let mut derived_score = 0.0;
            let mut total_matches = 0;
            let mut high_priority_matches = 0;
            let mut range_matches = 0;

            for token in &item_tokens {
                if spec.selected_tokens.contains(token) {
                    total_matches += 1;
                    if spec.high_priority_tokens.contains(token) {
                        high_priority_matches += 1;
                    }
                    derived_score += spec.token_weights.get(token).copied().unwrap_or(0.0);
                }
            }

            // An explicit numeric bound is a hard constraint: satisfying it
            // always counts as high-priority, independent of section position.
            for (section_key, bounds) in &spec.range_bounds {
                let Some(criterion) = by_key.get(section_key) else {
                    continue;
                };
                let Some(path) = criterion.path.as_deref() else {
                    continue;
                };
                let Some(resolved) = resolve_path(item, path) else {
                    continue;
                };
                let Some(numeric) = coerce_number(&resolved) else {
                    continue;
                };
                if bounds.contains(numeric) {
                    total_matches += 1;
                    high_priority_matches += 1;
                    range_matches += 1;
                    derived_score += spec
                        .section_weights
                        .get(section_key)
                        .copied()
                        .unwrap_or(0.0);
                }
            }

            ScoredItem {
                item: item.clone(),
                derived_score,
                total_matches,
                high_priority_matches,
                range_matches,
                relative_score: None,
                index,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spec::build_priority_spec;
    use crate::models::{RangeBounds, RankingParams, SectionSelection};
    use serde_json::json;
    use std::collections::BTreeMap;

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

    fn test_criteria() -> Vec<Criterion> {
        vec![
            criterion("price", CriterionKind::NumericRange, "price"),
            criterion("brand", CriterionKind::CategoricalMulti, "brands"),
            criterion("notes", CriterionKind::FreeText, "description"),
        ]
    }

    #[test]
    fn test_worked_example_price_then_brand() {
        let order = vec!["price".to_string(), "brand".to_string()];
        let mut selections = BTreeMap::new();
        selections.insert(
            "price".to_string(),
            SectionSelection::Range(RangeBounds {
                min: Some(100.0),
                max: Some(500.0),
            }),
        );
        selections.insert(
            "brand".to_string(),
            SectionSelection::Values(vec!["acme".to_string(), "zonko".to_string()]),
        );
        let spec = build_priority_spec(&order, &selections, &RankingParams::default());
        let criteria = test_criteria();

        let items = vec![
            json!({"price": 300, "brands": ["acme"]}),
            json!({"price": 1000, "brands": ["acme", "zonko"]}),
        ];
        let scored = score_items(&items, &spec, &criteria);

        // Item A: range match (5.0) + acme (1.0)
        assert!((scored[0].derived_score - 6.0).abs() < 1e-9);
        assert_eq!(scored[0].range_matches, 1);
        assert_eq!(scored[0].total_matches, 2);

        // Item B: range fails, acme (1.0) + zonko (0.65)
        assert!((scored[1].derived_score - 1.65).abs() < 1e-9);
        assert_eq!(scored[1].range_matches, 0);
    }

    #[test]
    fn test_range_match_counts_as_high_priority() {
        let order = vec!["price".to_string()];
        let mut selections = BTreeMap::new();
        selections.insert(
            "price".to_string(),
            SectionSelection::Range(RangeBounds {
                min: Some(10.0),
                max: Some(20.0),
            }),
        );
        let spec = build_priority_spec(&order, &selections, &RankingParams::default());

        let items = vec![json!({"price": 10}), json!({"price": 21})];
        let scored = score_items(&items, &spec, &test_criteria());

        assert_eq!(scored[0].high_priority_matches, 1);
        assert_eq!(scored[0].range_matches, 1);
        assert_eq!(scored[1].total_matches, 0);
    }

    #[test]
    fn test_non_numeric_range_field_skipped_without_penalty() {
        let order = vec!["price".to_string(), "brand".to_string()];
        let mut selections = BTreeMap::new();
        selections.insert(
            "price".to_string(),
            SectionSelection::Range(RangeBounds {
                min: Some(10.0),
                max: None,
            }),
        );
        selections.insert(
            "brand".to_string(),
            SectionSelection::Values(vec!["acme".to_string()]),
        );
        let spec = build_priority_spec(&order, &selections, &RankingParams::default());

        let items = vec![json!({"price": "call for pricing", "brands": ["acme"]})];
        let scored = score_items(&items, &spec, &test_criteria());

        assert_eq!(scored[0].range_matches, 0);
        assert!((scored[0].derived_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_free_text_terms_matched_in_haystack() {
        let order = vec!["notes".to_string()];
        let mut selections = BTreeMap::new();
        selections.insert(
            "notes".to_string(),
            SectionSelection::Values(vec!["sunburst".to_string(), "relic".to_string()]),
        );
        let spec = build_priority_spec(&order, &selections, &RankingParams::default());

        let items = vec![json!({"description": "Vintage Sunburst Finish"})];
        let scored = score_items(&items, &spec, &test_criteria());

        assert_eq!(scored[0].total_matches, 1);
        assert!((scored[0].derived_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_synthetic_term_section_scores_through_base_criterion() {
        let order = vec!["search_term_item:notes:sunburst".to_string()];
        let selections = BTreeMap::new();
        let spec = build_priority_spec(&order, &selections, &RankingParams::default());

        let items = vec![
            json!({"description": "Vintage Sunburst Finish"}),
            json!({"description": "Olympic White"}),
        ];
        let scored = score_items(&items, &spec, &test_criteria());

        assert_eq!(scored[0].total_matches, 1);
        assert_eq!(scored[1].total_matches, 0);
    }

    #[test]
    fn test_sections_outside_spec_ignored() {
        let order = vec!["brand".to_string()];
        let mut selections = BTreeMap::new();
        selections.insert(
            "brand".to_string(),
            SectionSelection::Values(vec!["acme".to_string()]),
        );
        let spec = build_priority_spec(&order, &selections, &RankingParams::default());

        // Rich item data outside the active sections contributes nothing.
        let items = vec![json!({
            "brands": ["acme"],
            "description": "acme special",
            "price": 300
        })];
        let scored = score_items(&items, &spec, &test_criteria());

        assert_eq!(scored[0].total_matches, 1);
        assert!((scored[0].derived_score - 1.0).abs() < 1e-9);
    }
}
