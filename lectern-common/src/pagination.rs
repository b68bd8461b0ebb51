//! Offset pagination over an ordered sequence.
//!
//! The paginator never sees the sequence itself. It only needs the total count
//! to decide which window to serve, so the store can fetch just that slice.

use serde::Serialize;
use std::num::NonZeroU64;

pub const DEFAULT_PAGE_SIZE: NonZeroU64 = NonZeroU64::new(10).unwrap();

/// A 1-indexed page number as requested by a client.
///
/// Parsing is lenient: anything that is not a positive integer is page 1.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct PageNumber(NonZeroU64);

impl PageNumber {
    pub const FIRST: Self = Self(NonZeroU64::MIN);

    #[must_use]
    pub fn new(number: u64) -> Self {
        NonZeroU64::new(number).map_or(Self::FIRST, Self)
    }

    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|raw| raw.trim().parse::<u64>().ok())
            .map_or(Self::FIRST, Self::new)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Paginator {
    page_size: NonZeroU64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    #[must_use]
    pub fn new(page_size: NonZeroU64) -> Self {
        Self { page_size }
    }

    #[must_use]
    pub fn page_size(self) -> u64 {
        self.page_size.get()
    }

    /// Picks the window to serve for `requested` out of `total_count` items.
    ///
    /// Pages past the end clamp to the last page. An empty sequence still has
    /// one (empty) page.
    #[must_use]
    pub fn window(self, total_count: u64, requested: PageNumber) -> PageWindow {
        let num_pages = total_count.div_ceil(self.page_size.get()).max(1);
        let number = requested.get().min(num_pages);

        PageWindow {
            number,
            num_pages,
            total_count,
            page_size: self.page_size.get(),
        }
    }

    /// Paginates an in-memory slice.
    #[must_use]
    pub fn paginate_slice<T: Clone>(self, items: &[T], requested: PageNumber) -> Page<T> {
        let window = self.window(items.len() as u64, requested);
        let start = usize::try_from(window.offset()).unwrap_or(usize::MAX);
        let end = usize::try_from(window.offset() + window.limit()).unwrap_or(usize::MAX);

        let slice = items
            .get(start.min(items.len())..end.min(items.len()))
            .unwrap_or_default();
        Page::new(slice.to_vec(), window)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct PageWindow {
    number: u64,
    num_pages: u64,
    total_count: u64,
    page_size: u64,
}

impl PageWindow {
    #[must_use]
    pub fn number(self) -> u64 {
        self.number
    }

    #[must_use]
    pub fn num_pages(self) -> u64 {
        self.num_pages
    }

    #[must_use]
    pub fn total_count(self) -> u64 {
        self.total_count
    }

    /// Number of items before this page.
    #[must_use]
    pub fn offset(self) -> u64 {
        (self.number - 1) * self.page_size
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub fn limit(self) -> u64 {
        self.page_size
    }

    #[must_use]
    pub fn has_next(self) -> bool {
        self.number < self.num_pages
    }

    #[must_use]
    pub fn has_previous(self) -> bool {
        self.number > 1
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number(),
            num_pages: window.num_pages(),
            total_count: window.total_count(),
            has_next: window.has_next(),
            has_previous: window.has_previous(),
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total_count: self.total_count,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pagination::{PageNumber, Paginator};
    use std::num::NonZeroU64;

    fn paginator(size: u64) -> Paginator {
        Paginator::new(NonZeroU64::new(size).unwrap())
    }

    #[test]
    fn fifteen_items_split_ten_and_five() {
        let items: Vec<u32> = (0..15).collect();
        let paginator = paginator(10);

        let first = paginator.paginate_slice(&items, PageNumber::new(1));
        assert_eq!(first.items, (0..10).collect::<Vec<_>>());
        assert_eq!(first.total_count, 15);
        assert_eq!(first.num_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = paginator.paginate_slice(&items, PageNumber::new(2));
        assert_eq!(second.items, (10..15).collect::<Vec<_>>());
        assert!(!second.has_next);
        assert!(second.has_previous);
    }

    #[test]
    fn pages_concatenate_to_the_whole_sequence() {
        for (len, size) in [(0, 10), (1, 10), (10, 10), (11, 10), (15, 10), (23, 4), (7, 1)] {
            let items: Vec<u32> = (0..len).collect();
            let paginator = paginator(size);
            let num_pages = paginator.window(u64::from(len), PageNumber::FIRST).num_pages();

            let concatenated: Vec<u32> = (1..=num_pages)
                .flat_map(|n| paginator.paginate_slice(&items, PageNumber::new(n)).items)
                .collect();

            assert_eq!(concatenated, items, "len = {len}, size = {size}");
        }
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let items: Vec<u32> = (0..15).collect();
        let paginator = paginator(10);

        let past_end = paginator.paginate_slice(&items, PageNumber::new(99));
        assert_eq!(past_end.number, 2);
        assert_eq!(past_end.items, (10..15).collect::<Vec<_>>());

        let zero = paginator.paginate_slice(&items, PageNumber::new(0));
        assert_eq!(zero.number, 1);
        assert_eq!(zero.items.len(), 10);
    }

    #[test]
    fn empty_sequence_has_one_empty_page() {
        let page = paginator(10).paginate_slice::<u32>(&[], PageNumber::new(3));

        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn lenient_page_number_parsing() {
        assert_eq!(PageNumber::parse(None), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("abc")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("-3")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("0")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some(" 4 ")).get(), 4);
    }

    #[test]
    fn window_offsets() {
        let window = paginator(10).window(35, PageNumber::new(3));

        assert_eq!(window.offset(), 20);
        assert_eq!(window.limit(), 10);
        assert_eq!(window.num_pages(), 4);
        assert!(window.has_next());
        assert!(window.has_previous());
    }
}
