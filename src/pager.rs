//! Fixed size pagination over the filtered view.

/// Page sizes offered by the UI. Cycling wraps around.
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [10, 20, 30, 40, 50];

/// Number of pages needed for `len` items, at least 1 so an empty set is
/// still representable as "page 1 of 1".
pub fn page_count(len: usize, page_size: usize) -> usize {
    std::cmp::max(1, len.div_ceil(page_size))
}

/// The slice of `items` for `page_index` and the total page count.
///
/// An out of range index yields an empty slice. Callers are expected to
/// clamp, this is only the defensive fallback.
pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> (&[T], usize) {
    let pages = page_count(items.len(), page_size);
    let begin = std::cmp::min(page_index.saturating_mul(page_size), items.len());
    let end = std::cmp::min(begin + page_size, items.len());
    (&items[begin..end], pages)
}

/// Session local pagination state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        PaginationState {
            page_index: 0,
            page_size: PAGE_SIZE_OPTIONS[0],
        }
    }
}

impl PaginationState {
    /// Re-validate `page_index` against a new filtered length. Needed
    /// whenever filtering or a fresh record set shrinks the page count.
    pub fn clamp_to(&mut self, len: usize) {
        let last = page_count(len, self.page_size) - 1;
        self.page_index = std::cmp::min(self.page_index, last);
    }

    /// Size changes invalidate the position.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size;
        self.page_index = 0;
    }

    pub fn cycle_page_size(&mut self) {
        let next = PAGE_SIZE_OPTIONS
            .iter()
            .position(|&s| s == self.page_size)
            .map(|pos| (pos + 1) % PAGE_SIZE_OPTIONS.len())
            .unwrap_or(0);
        self.set_page_size(PAGE_SIZE_OPTIONS[next]);
    }

    pub fn first(&mut self, _len: usize) {
        self.page_index = 0;
    }

    pub fn last(&mut self, len: usize) {
        self.page_index = page_count(len, self.page_size) - 1;
    }

    /// No-op when already on the first page.
    pub fn prev(&mut self, _len: usize) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    /// No-op when already on the last page.
    pub fn next(&mut self, len: usize) {
        let last = page_count(len, self.page_size) - 1;
        self.page_index = std::cmp::min(self.page_index + 1, last);
    }

    /// Jump to a 0-based page index, clamped to the available range.
    pub fn go_to(&mut self, page_index: usize, len: usize) {
        let last = page_count(len, self.page_size) - 1;
        self.page_index = std::cmp::min(page_index, last);
    }
}
