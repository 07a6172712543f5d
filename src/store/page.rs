//! Pagination over derived views of the catalog.

use std::num::NonZeroUsize;

use serde::Serialize;

/// One page of a filtered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Number of matches before pagination.
    pub count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub keys: T,
}

impl<T> Page<Vec<T>> {
    /// Slice `items` into the requested page.
    ///
    /// Pages are 1-based; page `0` is treated as page `1`. A page past the end
    /// yields an empty slice rather than an error.
    #[must_use]
    pub fn paginate(items: Vec<T>, page: usize, page_size: NonZeroUsize) -> Self {
        let page = page.max(1);
        let size = page_size.get();
        let count = items.len();
        let start = (page - 1).saturating_mul(size);

        let keys = items.into_iter().skip(start).take(size).collect();

        Self { count, total_pages: count.div_ceil(size), current_page: page, page_size: size, keys }
    }
}

impl<T> Page<T> {
    /// Transform the page content, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            total_pages: self.total_pages,
            current_page: self.current_page,
            page_size: self.page_size,
            keys: f(self.keys),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::matchers::is_empty as empty;
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[rstest]
    #[case(0, 50, 0)]
    #[case(1, 50, 1)]
    #[case(50, 50, 1)]
    #[case(51, 50, 2)]
    #[case(7, 3, 3)]
    fn total_pages_rounds_up(#[case] count: usize, #[case] page_size: usize, #[case] expected: usize) {
        let page = Page::paginate((0..count).collect::<Vec<_>>(), 1, size(page_size));

        assert_eq!(page.total_pages, expected);
        assert_eq!(page.count, count);
    }

    #[googletest::test]
    fn pages_concatenate_to_full_set() {
        let items: Vec<usize> = (0..23).collect();
        let first = Page::paginate(items.clone(), 1, size(5));

        let mut collected = Vec::new();
        for number in 1..=first.total_pages {
            collected.extend(Page::paginate(items.clone(), number, size(5)).keys);
        }

        expect_that!(collected, eq(&items));
    }

    #[googletest::test]
    fn out_of_range_page_is_empty() {
        let page = Page::paginate(vec!["a", "b"], 3, size(2));

        expect_that!(page.keys, empty());
        expect_that!(page.current_page, eq(3));
        expect_that!(page.total_pages, eq(1));
    }

    #[googletest::test]
    fn page_zero_is_first_page() {
        let page = Page::paginate(vec![1, 2, 3], 0, size(2));

        expect_that!(page.current_page, eq(1));
        expect_that!(page.keys, elements_are![eq(&1), eq(&2)]);
    }

    #[googletest::test]
    fn huge_page_number_does_not_overflow() {
        let page = Page::paginate(vec![1, 2, 3], usize::MAX, size(2));

        expect_that!(page.keys, empty());
    }
}
