use crate::models::{Page, PageInfo, ScoredItem};
use std::cmp::Ordering;

/// Order scored items for display.
///
/// With no selections there is no ranking signal: input order is preserved
/// and every score reads zero. Otherwise items sort descending by derived
/// score with the original index as a stable tie-break, and each item gets a
/// 0-100 score relative to the top result.
pub fn rank(mut scored: Vec<ScoredItem>, total_selected_count: usize) -> Vec<ScoredItem> {
    if total_selected_count == 0 {
        for entry in &mut scored {
            entry.derived_score = 0.0;
            entry.relative_score = None;
        }
        return scored;
    }

    scored.sort_by(|a, b| {
        b.derived_score
            .partial_cmp(&a.derived_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });

    let top_score = scored
        .iter()
        .map(|entry| entry.derived_score)
        .fold(0.0_f64, f64::max);
    if top_score > 0.0 {
        for entry in &mut scored {
            entry.relative_score = Some((100.0 * entry.derived_score / top_score).round() as u32);
        }
    }

    scored
}

/// Slice ranked items into a 1-based page.
///
/// When the ranked set shrinks below the requested page, the view resets to
/// page 1 instead of returning an empty slice.
pub fn paginate(ranked: Vec<ScoredItem>, page: usize, per_page: usize) -> Page {
    let per_page = per_page.max(1);
    let total = ranked.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = if page == 0 || page > total_pages {
        1
    } else {
        page
    };

    let start = (page - 1) * per_page;
    let items: Vec<ScoredItem> = ranked.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        info: PageInfo {
            page,
            per_page,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scored(index: usize, score: f64) -> ScoredItem {
        ScoredItem {
            item: json!({"id": index}),
            derived_score: score,
            total_matches: 0,
            high_priority_matches: 0,
            range_matches: 0,
            relative_score: None,
            index,
        }
    }

    #[test]
    fn test_sorts_descending_with_stable_tie_break() {
        let ranked = rank(
            vec![scored(0, 1.0), scored(1, 6.0), scored(2, 1.0)],
            3,
        );

        let order: Vec<usize> = ranked.iter().map(|entry| entry.index).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_no_selections_preserves_order() {
        let ranked = rank(
            vec![scored(0, 3.0), scored(1, 9.0), scored(2, 1.0)],
            0,
        );

        let order: Vec<usize> = ranked.iter().map(|entry| entry.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert!(ranked.iter().all(|entry| entry.derived_score == 0.0));
        assert!(ranked.iter().all(|entry| entry.relative_score.is_none()));
    }

    #[test]
    fn test_relative_score_against_top() {
        let ranked = rank(vec![scored(0, 6.0), scored(1, 1.65)], 3);

        assert_eq!(ranked[0].relative_score, Some(100));
        // round(100 * 1.65 / 6.0) = round(27.5) = 28
        assert_eq!(ranked[1].relative_score, Some(28));
    }

    #[test]
    fn test_all_zero_scores_stay_unscored() {
        let ranked = rank(vec![scored(0, 0.0), scored(1, 0.0)], 2);
        assert!(ranked.iter().all(|entry| entry.relative_score.is_none()));
    }

    #[test]
    fn test_pagination_boundaries() {
        let items: Vec<ScoredItem> = (0..125).map(|i| scored(i, 0.0)).collect();

        let page = paginate(items.clone(), 3, 50);
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.info.total, 125);
        assert_eq!(page.info.total_pages, 3);
        assert!(!page.info.has_next_page);
        assert!(page.info.has_prev_page);

        let first = paginate(items, 1, 50);
        assert_eq!(first.items.len(), 50);
        assert!(first.info.has_next_page);
        assert!(!first.info.has_prev_page);
    }

    #[test]
    fn test_out_of_range_page_resets_to_first() {
        let items: Vec<ScoredItem> = (0..10).map(|i| scored(i, 0.0)).collect();

        let page = paginate(items, 9, 4);
        assert_eq!(page.info.page, 1);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.items[0].index, 0);
    }

    #[test]
    fn test_empty_set_yields_single_empty_page() {
        let page = paginate(Vec::new(), 1, 24);
        assert_eq!(page.info.total, 0);
        assert_eq!(page.info.total_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.info.has_next_page);
        assert!(!page.info.has_prev_page);
    }
}
