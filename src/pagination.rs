//! Rolling pagination over a capacity-limited collection.
//!
//! At most [`STUDIES_LIMIT`] results are ever addressable. The page cursor
//! wraps within the window of pages that fit under the limit, so a page
//! number pushed past the last real page still maps onto a valid slice.

use std::ops::Range;

pub const STUDIES_LIMIT: usize = 101;

/// Study count used for display and paging once the limit is applied.
pub fn clamp_total(total: usize, limit: usize) -> usize {
    total.min(limit)
}

/// Page size actually used for slicing; never wider than the limit.
pub fn effective_page_size(results_per_page: u32, limit: usize) -> usize {
    (results_per_page.max(1) as usize).min(limit.max(1))
}

/// Number of pages that fit under the limit (`floor(limit / page size)`).
pub fn rolling_page_number_mod(results_per_page: u32, limit: usize) -> usize {
    (limit / effective_page_size(results_per_page, limit)).max(1)
}

/// Zero-based page index within the rolling window.
pub fn rolling_page_number(page_number: u32, results_per_page: u32, limit: usize) -> usize {
    let page_index = page_number.max(1) as usize - 1;
    page_index % rolling_page_number_mod(results_per_page, limit)
}

/// Index range of the visible slice, before clipping to the collection.
pub fn page_window(page_number: u32, results_per_page: u32, limit: usize) -> Range<usize> {
    let take = effective_page_size(results_per_page, limit);
    let offset = take * rolling_page_number(page_number, results_per_page, limit);
    offset..offset + take
}

/// Clips the window to a collection of `len` items.
pub fn visible_range(page_number: u32, results_per_page: u32, len: usize, limit: usize) -> Range<usize> {
    let window = page_window(page_number, results_per_page, limit);
    window.start.min(len)..window.end.min(len)
}

/// Whether advancing from `page_number` is allowed: the next page must start
/// below the ceiling-clamped total.
pub fn has_next_page(page_number: u32, results_per_page: u32, total: usize, limit: usize) -> bool {
    let next_offset = page_number.max(1) as usize * results_per_page.max(1) as usize;
    next_offset < clamp_total(total, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_clamped_to_the_limit() {
        assert_eq!(clamp_total(150, STUDIES_LIMIT), 101);
        assert_eq!(clamp_total(40, STUDIES_LIMIT), 40);
    }

    #[test]
    fn cursor_wraps_inside_the_window() {
        assert_eq!(rolling_page_number_mod(25, STUDIES_LIMIT), 4);
        assert_eq!(rolling_page_number(1, 25, STUDIES_LIMIT), 0);
        assert_eq!(rolling_page_number(4, 25, STUDIES_LIMIT), 3);
        assert_eq!(rolling_page_number(5, 25, STUDIES_LIMIT), 0);
        assert_eq!(page_window(5, 25, STUDIES_LIMIT), 0..25);
        assert_eq!(page_window(3, 25, STUDIES_LIMIT), 50..75);
    }

    #[test]
    fn oversized_pages_are_capped() {
        assert_eq!(page_window(1, 500, STUDIES_LIMIT), 0..101);
        assert_eq!(page_window(7, 500, STUDIES_LIMIT), 0..101);
        assert_eq!(page_window(2, 101, STUDIES_LIMIT), 0..101);
    }

    #[test]
    fn visible_range_clips_to_the_collection() {
        assert_eq!(visible_range(2, 25, 30, STUDIES_LIMIT), 25..30);
        assert_eq!(visible_range(3, 25, 30, STUDIES_LIMIT), 30..30);
    }

    #[test]
    fn advancing_past_the_clamped_total_is_refused() {
        assert!(!has_next_page(5, 25, 150, STUDIES_LIMIT));
        assert!(has_next_page(4, 25, 150, STUDIES_LIMIT));
        assert!(has_next_page(2, 25, 60, STUDIES_LIMIT));
        assert!(!has_next_page(3, 25, 60, STUDIES_LIMIT));
        assert!(!has_next_page(1, 25, 25, STUDIES_LIMIT));
    }
}
