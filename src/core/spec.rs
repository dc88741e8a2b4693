use crate::core::extract::normalize_str;
use crate::models::{PrioritySpec, RangeBounds, RankingParams, SectionSelection};
use std::collections::{BTreeMap, HashSet};

use crate::models::SEARCH_TERM_ITEM_PREFIX;

/// Components of a synthetic per-term section key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTermKey {
    pub base_key: String,
    pub term: String,
}

/// Parse a `search_term_item:<base_key>:<percent-encoded term>` section key.
pub fn parse_search_term_key(key: &str) -> Option<SearchTermKey> {
    let rest = key.strip_prefix(SEARCH_TERM_ITEM_PREFIX)?;
    let separator = rest.find(':')?;
    let term = urlencoding::decode(&rest[separator + 1..]).ok()?;
    Some(SearchTermKey {
        base_key: rest[..separator].to_string(),
        term: term.into_owned(),
    })
}

/// Dominance weight for the section at `index` among `total_sections`
/// surviving sections: `base^(total - index - 1)`.
#[inline]
pub fn section_weight(params: &RankingParams, total_sections: usize, index: usize) -> f64 {
    let power = total_sections.saturating_sub(index + 1);
    params.base.powi(power as i32)
}

/// Within-section weight of the value at `rank`: `decay^rank`.
#[inline]
pub fn value_weight(params: &RankingParams, rank: usize) -> f64 {
    params.decay.powi(rank as i32)
}

struct ActiveSection {
    key: String,
    values: Vec<String>,
    range: Option<RangeBounds>,
}

/// Compile the user's ordered section list and per-section selections into
/// the weighted token map used by the scorer.
///
/// Sections with no active selection are dropped; weights are computed over
/// the surviving sections only, so the highest-priority active section always
/// carries the largest dominance weight. Keys and values are normalized
/// before token construction, empties dropped and repeated values deduplicated
/// keeping the first occurrence's rank.
pub fn build_priority_spec(
    section_order: &[String],
    selections: &BTreeMap<String, SectionSelection>,
    params: &RankingParams,
) -> PrioritySpec {
    let mut seen_sections: HashSet<String> = HashSet::new();
    let mut active: Vec<ActiveSection> = Vec::new();

    for raw_key in section_order {
        let key = normalize_str(raw_key);
        if key.is_empty() || !seen_sections.insert(key.clone()) {
            continue;
        }

        let selection = selections.get(raw_key).or_else(|| selections.get(&key));

        let mut values: Vec<String> = Vec::new();
        let mut range: Option<RangeBounds> = None;
        if let Some(selection) = selection {
            match selection {
                SectionSelection::Range(bounds) => {
                    if bounds.is_active() {
                        range = Some(*bounds);
                    }
                }
                other => {
                    let mut seen_values: HashSet<String> = HashSet::new();
                    for raw_value in other.ranked_values() {
                        let value = normalize_str(&raw_value);
                        if value.is_empty() || !seen_values.insert(value.clone()) {
                            continue;
                        }
                        values.push(value);
                    }
                }
            }
        }

        // A synthetic per-term key carries its own search term when nothing
        // was selected under it explicitly.
        if values.is_empty() && range.is_none() {
            if let Some(parsed) = parse_search_term_key(&key) {
                let term = normalize_str(&parsed.term);
                if !term.is_empty() {
                    values.push(term);
                }
            }
        }

        if values.is_empty() && range.is_none() {
            continue;
        }
        active.push(ActiveSection { key, values, range });
    }

    let total_sections = active.len();
    let mut spec = PrioritySpec::default();

    for (index, section) in active.into_iter().enumerate() {
        let weight = section_weight(params, total_sections, index);
        spec.sections.push(section.key.clone());
        spec.section_weights.insert(section.key.clone(), weight);

        if let Some(bounds) = section.range {
            // Ranges count as one selection unit but produce no ranked tokens.
            spec.range_bounds.insert(section.key.clone(), bounds);
            spec.total_selected_count += 1;
            continue;
        }

        spec.total_selected_count += section.values.len();
        for (rank, value) in section.values.iter().enumerate() {
            let rank_weight = value_weight(params, rank);
            let token = format!("{}:{}", section.key, value);
            spec.token_weights
                .insert(token.clone(), weight * rank_weight);
            spec.selected_tokens.insert(token.clone());
            if rank_weight >= params.high_priority_threshold {
                spec.high_priority_tokens.insert(token);
            }
        }
        spec.values_by_section.insert(section.key, section.values);
    }

    spec
}
