//! Offset pagination shared by every post listing.
//!
//! A requested page number is never an error: anything missing, malformed
//! or out of range is clamped onto the nearest page that exists.

use std::num::IntErrorKind;

use serde::Deserialize;

/// The `?page=` query parameter, kept as raw text so that junk values fall
/// back to the first page instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A page number as asked for by the client, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest(i64);

impl PageRequest {
    pub fn first() -> Self {
        Self(1)
    }

    pub fn number(number: i64) -> Self {
        Self(number)
    }

    /// Integers too large to represent still mean "past the end".
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::first();
        };
        match raw.trim().parse::<i64>() {
            Ok(number) => Self(number),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Self(i64::MAX),
            Err(_) => Self::first(),
        }
    }
}

impl From<&PageQuery> for PageRequest {
    fn from(query: &PageQuery) -> Self {
        Self::parse(query.page.as_deref())
    }
}

/// Which rows of an ordered result set make up one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
    pub offset: u64,
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u32,
}

impl Paginator {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// An empty set still has one (empty) page.
    pub fn num_pages(&self, total: u64) -> u32 {
        let pages = total.div_ceil(u64::from(self.per_page)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn window(&self, total: u64, request: PageRequest) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = request.0.clamp(1, i64::from(num_pages)) as u32;
        PageWindow {
            number,
            num_pages,
            total,
            offset: u64::from(number - 1) * u64::from(self.per_page),
            limit: self.per_page,
        }
    }
}

/// One page of records plus the metadata templates need for navigation.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    pub fn next_page_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_len(total: u64, per_page: u32, requested: i64) -> u64 {
        let window = Paginator::new(per_page).window(total, PageRequest::number(requested));
        window
            .total
            .saturating_sub(window.offset)
            .min(u64::from(window.limit))
    }

    #[test]
    fn parse_defaults_to_first_page() {
        assert_eq!(PageRequest::parse(None), PageRequest::first());
        assert_eq!(PageRequest::parse(Some("")), PageRequest::first());
        assert_eq!(PageRequest::parse(Some("last")), PageRequest::first());
        assert_eq!(PageRequest::parse(Some("2.5")), PageRequest::first());
        assert_eq!(PageRequest::parse(Some(" 3 ")), PageRequest::number(3));
        assert_eq!(
            PageRequest::parse(Some("-99999999999999999999")),
            PageRequest::first()
        );
    }

    #[test]
    fn overflowing_page_number_lands_on_last_page() {
        let request = PageRequest::parse(Some("99999999999999999999"));
        assert_eq!(request, PageRequest::number(i64::MAX));
        let window = Paginator::new(10).window(15, request);
        assert_eq!(window.number, 2);
        assert_eq!(window.offset, 10);
    }

    #[test]
    fn fifteen_records_split_ten_and_five() {
        assert_eq!(page_len(15, 10, 1), 10);
        assert_eq!(page_len(15, 10, 2), 5);
    }

    #[test]
    fn page_sizes_follow_formula() {
        for total in 0..40u64 {
            let per_page = 7u32;
            let pages = total.div_ceil(7).max(1);
            for k in 1..=pages {
                let expected = (u64::from(per_page)).min(total - (k - 1) * 7);
                assert_eq!(page_len(total, per_page, k as i64), expected);
            }
        }
    }

    #[test]
    fn beyond_last_page_clamps_to_last() {
        let window = Paginator::new(10).window(15, PageRequest::number(99));
        assert_eq!(window.number, 2);
        assert_eq!(window.offset, 10);
    }

    #[test]
    fn below_first_page_clamps_to_first() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.window(15, PageRequest::number(0)).number, 1);
        assert_eq!(paginator.window(15, PageRequest::number(-4)).number, 1);
    }

    #[test]
    fn empty_set_has_one_page() {
        let window = Paginator::new(10).window(0, PageRequest::number(3));
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.number, 1);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        assert_eq!(Paginator::new(0).per_page(), 1);
    }

    #[test]
    fn page_navigation_metadata() {
        let paginator = Paginator::new(10);
        let first = Page::new(vec![0; 10], paginator.window(25, PageRequest::first()));
        assert!(first.has_next());
        assert!(!first.has_previous());
        assert_eq!(first.next_page_number(), Some(2));
        assert_eq!(first.previous_page_number(), None);

        let last = Page::new(vec![0; 5], paginator.window(25, PageRequest::number(3)));
        assert!(!last.has_next());
        assert!(last.has_previous());
        assert_eq!(last.previous_page_number(), Some(2));

        let only = Page::<u8>::new(vec![], paginator.window(0, PageRequest::first()));
        assert!(!only.has_other_pages());
        assert!(only.is_empty());
    }
}
