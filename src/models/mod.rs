// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Criterion, CriterionKind, Page, PageInfo, PrioritySpec, RangeBounds, RankingParams, ScoredItem,
    SectionOrder, SectionSelection, SEARCH_TERM_ITEM_PREFIX,
};
pub use requests::SearchRequest;
pub use responses::{ErrorResponse, HealthResponse, SearchResponse};
