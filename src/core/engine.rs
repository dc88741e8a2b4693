use crate::core::ranker::{paginate, rank};
use crate::core::scoring::score_items;
use crate::core::spec::build_priority_spec;
use crate::models::{Criterion, Page, PrioritySpec, RankingParams, ScoredItem, SectionSelection};
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of a full ranking run
#[derive(Debug)]
pub struct SearchOutcome {
    pub page: Page,
    pub total_selected_count: usize,
}

/// Ranking orchestrator - runs the pure spec/score/rank/paginate pipeline
///
/// # Pipeline stages
/// 1. Compile section order + selections into a priority spec
/// 2. Extract tokens and score every item
/// 3. Sort by derived score (stable tie-break on input order)
/// 4. Paginate
#[derive(Debug, Clone)]
pub struct Engine {
    params: RankingParams,
}

impl Engine {
    pub fn new(params: RankingParams) -> Self {
        Self { params }
    }

    pub fn with_default_params() -> Self {
        Self {
            params: RankingParams::default(),
        }
    }

    pub fn params(&self) -> &RankingParams {
        &self.params
    }

    /// Compile the current priority state into a weight map.
    pub fn build_spec(
        &self,
        section_order: &[String],
        selections: &BTreeMap<String, SectionSelection>,
    ) -> PrioritySpec {
        build_priority_spec(section_order, selections, &self.params)
    }

    /// Score items against an already-compiled spec.
    pub fn score(
        &self,
        items: &[Value],
        spec: &PrioritySpec,
        criteria: &[Criterion],
    ) -> Vec<ScoredItem> {
        score_items(items, spec, criteria)
    }

    /// Run the complete pipeline for one query snapshot.
    pub fn search(
        &self,
        items: &[Value],
        criteria: &[Criterion],
        section_order: &[String],
        selections: &BTreeMap<String, SectionSelection>,
        page: usize,
        per_page: usize,
    ) -> SearchOutcome {
        let spec = self.build_spec(section_order, selections);
        let scored = self.score(items, &spec, criteria);
        let ranked = rank(scored, spec.total_selected_count);
        let page = paginate(ranked, page, per_page);

        SearchOutcome {
            page,
            total_selected_count: spec.total_selected_count,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_default_params()
    }
}
