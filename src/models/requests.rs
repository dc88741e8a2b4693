use crate::models::domain::SectionSelection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Request to score, rank and paginate listings for one catalog.
///
/// `selections` is keyed by section key; the value shape selects the
/// selection kind (array = ranked values, object = numeric bounds,
/// bool = toggle). A `BTreeMap` keeps the serialized form canonical so the
/// request can double as a cache fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "config_key", rename = "configKey")]
    pub config_key: String,
    #[serde(default, alias = "section_order", rename = "sectionOrder")]
    pub section_order: Vec<String>,
    #[serde(default)]
    pub selections: BTreeMap<String, SectionSelection>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page", alias = "per_page", rename = "perPage")]
    #[validate(range(min = 1, max = 200))]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    24
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let req: SearchRequest = serde_json::from_str(r#"{"configKey": "guitars"}"#).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 24);
        assert!(req.section_order.is_empty());
        assert!(req.selections.is_empty());
    }

    #[test]
    fn test_snake_case_aliases() {
        let req: SearchRequest = serde_json::from_str(
            r#"{"config_key": "guitars", "per_page": 50, "section_order": ["price"]}"#,
        )
        .unwrap();
        assert_eq!(req.config_key, "guitars");
        assert_eq!(req.per_page, 50);
        assert_eq!(req.section_order, vec!["price".to_string()]);
    }
}
