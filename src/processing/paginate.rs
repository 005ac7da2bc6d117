//! Page slicing for [`crate::types::DataSet`].

use serde::{Deserialize, Serialize};

use crate::types::DataSet;

/// Page size used by most list screens.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 1-based page index + page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    pub page_index: usize,
    pub page_size: usize,
}

impl PageSpec {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// First page of `page_size` rows.
    pub fn first(page_size: usize) -> Self {
        Self::new(1, page_size)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of a dataset plus the totals a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: DataSet,
    /// Effective (clamped) 1-based page index.
    pub page_index: usize,
    /// Effective page size (never 0).
    pub page_size: usize,
    /// Number of pages for display; an empty dataset still has one (empty) page.
    pub total_pages: usize,
    pub total_count: usize,
}

/// Number of pages needed for `total_count` rows; at least 1.
pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1)).max(1)
}

/// Slice `dataset` to the page described by `spec`.
///
/// Out-of-range page indexes are clamped into `1..=total_pages` and a page size of 0 is treated
/// as 1, so this never panics and never returns an unexpectedly empty page.
pub fn paginate(dataset: &DataSet, spec: PageSpec) -> Page {
    let page_size = spec.page_size.max(1);
    let total_count = dataset.row_count();
    let total_pages = total_pages(total_count, page_size);
    let page_index = spec.page_index.clamp(1, total_pages);
    let start = (page_index - 1) * page_size;
    Page {
        items: dataset.slice_rows(start..start + page_size),
        page_index,
        page_size,
        total_pages,
        total_count,
    }
}

/// One entry of a numbered pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageSlot {
    Page(usize),
    Ellipsis,
}

/// Pager buttons: first, last, and the current page ±1, with ellipses over the gaps.
pub fn page_slots(current: usize, total: usize) -> Vec<PageSlot> {
    let total = total.max(1);
    let current = current.clamp(1, total);
    let mut slots = Vec::new();
    for page in 1..=total {
        let near = page + 1 >= current && page <= current + 1;
        if page == 1 || page == total || near {
            if let Some(PageSlot::Page(prev)) = slots.last() {
                if page > prev + 1 {
                    slots.push(PageSlot::Ellipsis);
                }
            }
            slots.push(PageSlot::Page(page));
        }
    }
    slots
}
