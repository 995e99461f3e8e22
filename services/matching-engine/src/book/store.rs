//! Sparse paged storage for price levels
//!
//! Direct-addressed map from a level index to a small copyable handle.
//! Storage is organised in fixed-size pages so that memory tracks the pages
//! actually touched rather than the full price range, while keeping O(1)
//! access on the matching hot path.

/// Default number of slots per page. Must be a power of two.
pub(crate) const DEFAULT_PAGE_SIZE: usize = 4096;

/// A growable, sparse, direct-addressed array of `Option<T>` slots.
///
/// Pages are allocated lazily on first write; reading an untouched index is
/// always valid and returns `None`. Slots are never cleared: an empty price
/// level is represented by the level record itself, not by slot removal.
#[derive(Debug, Clone)]
pub(crate) struct PagedVec<T> {
    page_size: usize,
    shift: u32,
    pages: Vec<Option<Box<[Option<T>]>>>,
}

impl<T: Copy> PagedVec<T> {
    /// Create an empty store.
    ///
    /// # Panics
    /// Panics if `page_size` is not a power of two.
    pub fn new(page_size: usize) -> Self {
        assert!(page_size.is_power_of_two(), "page size must be a power of two");
        Self {
            page_size,
            shift: page_size.trailing_zeros(),
            pages: Vec::new(),
        }
    }

    fn split(&self, index: u64) -> (usize, usize) {
        (
            (index >> self.shift) as usize,
            (index as usize) & (self.page_size - 1),
        )
    }

    /// Slot contents at `index`. O(1), never fails; out-of-extent indices and
    /// unallocated pages read as `None`.
    pub fn get(&self, index: u64) -> Option<T> {
        let (page_idx, slot) = self.split(index);
        self.pages.get(page_idx)?.as_ref()?[slot]
    }

    /// Write `value` at `index`, growing the page table as needed.
    /// Amortised O(1): the page sequence doubles when `index` lands past the
    /// current extent, and only the touched page is allocated.
    pub fn set(&mut self, index: u64, value: T) {
        let (page_idx, slot) = self.split(index);
        if page_idx >= self.pages.len() {
            let target = (page_idx * 2).max(page_idx + 1);
            self.pages.resize_with(target, || None);
        }
        let page_size = self.page_size;
        let page = self.pages[page_idx]
            .get_or_insert_with(|| vec![None; page_size].into_boxed_slice());
        page[slot] = Some(value);
    }

    /// Current extent in slots: page size times page count.
    pub fn slot_count(&self) -> u64 {
        (self.page_size * self.pages.len()) as u64
    }

    /// Nearest occupied slot at or below `from`, skipping unallocated pages
    /// wholesale.
    pub fn prev_set(&self, from: u64) -> Option<(u64, T)> {
        if self.pages.is_empty() {
            return None;
        }
        let mut index = from.min(self.slot_count() - 1);
        loop {
            let (page_idx, slot) = self.split(index);
            match &self.pages[page_idx] {
                Some(page) => {
                    if let Some(value) = page[slot] {
                        return Some((index, value));
                    }
                    if index == 0 {
                        return None;
                    }
                    index -= 1;
                }
                None => {
                    if page_idx == 0 {
                        return None;
                    }
                    index = (page_idx * self.page_size) as u64 - 1;
                }
            }
        }
    }

    /// Nearest occupied slot at or above `from`, bounded by the current
    /// extent.
    pub fn next_set(&self, from: u64) -> Option<(u64, T)> {
        let extent = self.slot_count();
        let mut index = from;
        while index < extent {
            let (page_idx, slot) = self.split(index);
            match &self.pages[page_idx] {
                Some(page) => {
                    if let Some(value) = page[slot] {
                        return Some((index, value));
                    }
                    index += 1;
                }
                None => index = ((page_idx + 1) * self.page_size) as u64,
            }
        }
        None
    }
}

impl<T: Copy> Default for PagedVec<T> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
