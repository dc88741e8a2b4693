// Core algorithm exports
pub mod engine;
pub mod extract;
pub mod ranker;
pub mod scoring;
pub mod spec;

pub use engine::{Engine, SearchOutcome};
pub use extract::{extract_text_tokens, extract_tokens, resolve_path, strip_markup};
pub use ranker::{paginate, rank};
pub use scoring::score_items;
pub use spec::{build_priority_spec, parse_search_term_key, section_weight, value_weight};
