//! crates/storecast_core/src/pagination.rs
//!
//! Page arithmetic for the message list. The page count is recomputed from
//! a fresh row count on every fetch, and requests are clamped against that
//! count, so deleting the last row of the last page lands the next fetch
//! on the new last page instead of an empty one.

/// Messages shown per page in the admin list.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A 1-indexed page request resolved against a fresh total row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
    page_size: u32,
    total: u64,
}

impl Page {
    /// Clamps `requested` into `[1, total_pages]` for a collection of
    /// `total` rows. Zero is treated as page one, and any page past the
    /// end resolves to the last page. An empty collection resolves to
    /// page one with an empty window.
    pub fn clamp(requested: u32, page_size: u32, total: u64) -> Self {
        let page_size = page_size.max(1);
        let last = total_pages(total, page_size).max(1);
        Self {
            number: requested.clamp(1, last),
            page_size,
            total,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.page_size)
    }

    /// Number of rows to skip to reach this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages()
    }
}

/// Ceiling division of `total` rows into pages of `page_size`. Zero rows
/// means zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = (total + page_size - 1) / page_size;
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(9, 1)]
    #[case(10, 1)]
    #[case(11, 2)]
    #[case(20, 2)]
    #[case(21, 3)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] expected: u32) {
        assert_eq!(total_pages(total, DEFAULT_PAGE_SIZE), expected);
    }

    #[test]
    fn first_of_three_pages_has_next_but_no_previous() {
        let page = Page::clamp(1, 10, 25);
        assert_eq!(page.number(), 1);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn last_of_three_pages_has_previous_but_no_next() {
        let page = Page::clamp(3, 10, 25);
        assert_eq!(page.number(), 3);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn middle_page_has_both_neighbours() {
        let page = Page::clamp(2, 10, 25);
        assert!(page.has_previous());
        assert!(page.has_next());
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(3, 3)]
    #[case(9, 3)]
    fn requests_clamp_into_the_valid_range(#[case] requested: u32, #[case] expected: u32) {
        let page = Page::clamp(requested, 10, 25);
        assert_eq!(page.number(), expected);
    }

    #[test]
    fn deleting_the_only_row_of_the_last_page_lands_on_the_new_last_page() {
        // 21 rows put one row on page 3; after deleting it 20 remain.
        let before = Page::clamp(3, 10, 21);
        assert_eq!(before.number(), 3);
        assert_eq!(before.offset(), 20);

        let after = Page::clamp(3, 10, 20);
        assert_eq!(after.number(), 2);
        assert_eq!(after.offset(), 10);
    }

    #[test]
    fn an_empty_collection_resolves_to_page_one() {
        let page = Page::clamp(1, 10, 0);
        assert_eq!(page.number(), 1);
        assert_eq!(page.total_pages(), 0);
        assert_eq!(page.offset(), 0);
        assert!(!page.has_previous());
        assert!(!page.has_next());
    }
}
