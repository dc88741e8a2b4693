use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Prefix for synthetic section keys that track a single free-text search
/// term as its own orderable section: `search_term_item:<base_key>:<encoded>`.
pub const SEARCH_TERM_ITEM_PREFIX: &str = "search_term_item:";

/// Kind of a comparison criterion, declaring its value domain and how the
/// extractor treats the resolved item value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CriterionKind {
    #[serde(rename = "categorical-multi", alias = "checkboxes")]
    CategoricalMulti,
    #[serde(rename = "categorical-single", alias = "select", alias = "scalar")]
    CategoricalSingle,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "numeric-range", alias = "range")]
    NumericRange,
    #[serde(rename = "free-text", alias = "text")]
    FreeText,
}

/// Immutable descriptor of one criterion, loaded from the catalog config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub key: String,
    pub label: String,
    pub kind: CriterionKind,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(rename = "allowCustomValue", default)]
    pub allow_custom_value: bool,
}

impl Criterion {
    /// Whether this criterion is matched by substring search instead of
    /// exact token equality.
    pub fn is_text(&self) -> bool {
        self.kind == CriterionKind::FreeText
    }
}

/// Numeric bounds for a range criterion. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl RangeBounds {
    /// A range selection only counts when at least one bound is set.
    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Bound-inclusive containment check.
    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

/// A user's selection for one section.
///
/// Ordered values for categorical and free-text sections (order = rank),
/// numeric bounds for range sections, an on/off flag for boolean ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionSelection {
    Values(Vec<String>),
    Range(RangeBounds),
    Toggle(bool),
}

impl SectionSelection {
    /// Raw ranked values for this selection, before normalization.
    pub fn ranked_values(&self) -> Vec<String> {
        match self {
            SectionSelection::Values(values) => values.clone(),
            SectionSelection::Toggle(enabled) => vec![enabled.to_string()],
            SectionSelection::Range(_) => Vec::new(),
        }
    }

    pub fn range(&self) -> Option<&RangeBounds> {
        match self {
            SectionSelection::Range(bounds) if bounds.is_active() => Some(bounds),
            _ => None,
        }
    }
}

/// User-mutable ordered list of section keys. Position defines cross-section
/// dominance; reordering is position based.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionOrder(pub Vec<String>);

impl SectionOrder {
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Move the entry at `from` to position `to`. Out-of-range indexes are
    /// ignored rather than panicking.
    pub fn move_entry(&mut self, from: usize, to: usize) {
        if from >= self.0.len() || to >= self.0.len() || from == to {
            return;
        }
        let entry = self.0.remove(from);
        self.0.insert(to, entry);
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(key.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.0.retain(|entry| entry != key);
    }
}

impl From<Vec<String>> for SectionOrder {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

/// Compiled weight map derived from the current section order and per-section
/// selections. Rebuilt in full on any relevant state change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrioritySpec {
    /// Surviving section keys, normalized, in priority order.
    pub sections: Vec<String>,
    /// Normalized ranked values per surviving section.
    pub values_by_section: HashMap<String, Vec<String>>,
    /// Weight per `"section:value"` token.
    pub token_weights: HashMap<String, f64>,
    /// Dominance weight per surviving section.
    pub section_weights: HashMap<String, f64>,
    pub selected_tokens: HashSet<String>,
    pub high_priority_tokens: HashSet<String>,
    /// Active numeric bounds per range section.
    pub range_bounds: HashMap<String, RangeBounds>,
    pub total_selected_count: usize,
}

impl PrioritySpec {
    /// No selections means no ranking signal: input order is preserved.
    pub fn has_selections(&self) -> bool {
        self.total_selected_count > 0
    }
}

/// Tunable constants for the dominance weighting scheme.
#[derive(Debug, Clone, Copy)]
pub struct RankingParams {
    /// Cross-section dominance base: section `i` of `n` weighs `base^(n-i-1)`.
    pub base: f64,
    /// Within-section decay: value at rank `r` weighs `decay^r`.
    pub decay: f64,
    /// Value weight at or above this threshold marks a token high-priority.
    pub high_priority_threshold: f64,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            base: 5.0,
            decay: 0.65,
            high_priority_threshold: 0.5,
        }
    }
}

/// An item plus its computed score breakdown. Ephemeral: recomputed on any
/// state change, never mutates the item itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: serde_json::Value,
    #[serde(rename = "derivedScore")]
    pub derived_score: f64,
    #[serde(rename = "totalMatches")]
    pub total_matches: usize,
    #[serde(rename = "highPriorityMatches")]
    pub high_priority_matches: usize,
    #[serde(rename = "rangeMatches")]
    pub range_matches: usize,
    /// Display score relative to the top-scoring item, 0-100.
    #[serde(rename = "relativeScore")]
    pub relative_score: Option<u32>,
    /// Original position in the input set, used as the sort tie-break.
    #[serde(skip)]
    pub index: usize,
}

/// Pagination metadata for one result page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: usize,
    #[serde(rename = "perPage")]
    pub per_page: usize,
    pub total: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "hasPrevPage")]
    pub has_prev_page: bool,
}

/// One page of ranked items.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<ScoredItem>,
    pub info: PageInfo,
}
