//! Listing Rank - priority-weighted multi-criteria ranking service
//!
//! This library turns a user's ordered preferences over comparison criteria
//! into a deterministic relevance score per catalog item, then sorts and
//! paginates the results. The pipeline (spec build, token extraction,
//! scoring, ranking, pagination) is pure and recomputed in full on any
//! relevant state change.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{build_priority_spec, paginate, rank, resolve_path, score_items, Engine};
pub use models::{
    Criterion, CriterionKind, PrioritySpec, RangeBounds, RankingParams, ScoredItem, SearchRequest,
    SearchResponse, SectionOrder, SectionSelection,
};
