//! Page navigation for the public song listing.
//!
//! Each page is its own cache entry ([`QueryKey::Songs`]), so moving between
//! pages only changes which key the listing reads. Mutations never move the
//! current page; an invalidated page is refetched in place.

use crate::cache::QueryKey;
use crate::types::Pagination;

/// Viewports narrower than this (in pixels) show a tighter page window.
pub const NARROW_VIEWPORT_MAX_WIDTH: u32 = 640;

/// Default page size for the public listing.
pub const DEFAULT_PER_PAGE: u32 = 6;

/// One slot in the rendered page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    /// Marks skipped page numbers between two shown ones
    Gap,
}

/// Viewport class, which decides how many neighbours of the current page are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    Narrow,
    Wide,
}

impl Viewport {
    pub fn from_width(width_px: u32) -> Self {
        if width_px < NARROW_VIEWPORT_MAX_WIDTH {
            Viewport::Narrow
        } else {
            Viewport::Wide
        }
    }

    /// Pages shown on each side of the current one.
    pub fn radius(self) -> u32 {
        match self {
            Viewport::Narrow => 1,
            Viewport::Wide => 2,
        }
    }
}

/// Page numbers to render for `current` out of `last` pages.
///
/// The first and last page are always shown, plus every page within `radius`
/// of `current`. A [`PageItem::Gap`] goes wherever consecutive shown pages
/// are not adjacent.
///
/// ```rust
/// use top5_client::pagination::{page_window, PageItem};
///
/// assert_eq!(
///     page_window(5, 10, 1),
///     vec![
///         PageItem::Page(1),
///         PageItem::Gap,
///         PageItem::Page(4),
///         PageItem::Page(5),
///         PageItem::Page(6),
///         PageItem::Gap,
///         PageItem::Page(10),
///     ]
/// );
/// ```
pub fn page_window(current: u32, last: u32, radius: u32) -> Vec<PageItem> {
    let last = last.max(1);
    let low = current.saturating_sub(radius).max(1);
    let high = current.saturating_add(radius).min(last);

    // Only the neighbourhood is walked, so the cost does not depend on `last`.
    let mut pages = vec![1];
    pages.extend((low..=high).filter(|&p| p != 1 && p != last));
    if last != 1 {
        pages.push(last);
    }

    let mut items = Vec::with_capacity(pages.len() * 2);
    let mut previous: Option<u32> = None;
    for page in pages {
        if previous.is_some_and(|prev| page != prev + 1) {
            items.push(PageItem::Gap);
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}

/// Tracks the current page of the public listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    current_page: u32,
    per_page: u32,
    total: Option<u64>,
    last_page: Option<u32>,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl PaginationController {
    pub fn new(per_page: u32) -> Self {
        Self {
            current_page: 1,
            per_page: per_page.max(1),
            total: None,
            last_page: None,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Last page as reported by the service, once a page has been loaded.
    pub fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Cache key for the current page.
    pub fn key(&self) -> QueryKey {
        QueryKey::Songs {
            page: self.current_page,
            per_page: self.per_page,
        }
    }

    /// Record the totals from a page response. The current page is left alone.
    pub fn apply(&mut self, pagination: &Pagination) {
        self.total = Some(pagination.total);
        self.last_page = Some(pagination.last_page.max(1));
    }

    /// Move to `page`, clamped into `[1, last_page]`. Returns the page moved to.
    ///
    /// Before any totals are known only the lower bound applies.
    pub fn go_to(&mut self, page: u32) -> u32 {
        let upper = self.last_page.unwrap_or(u32::MAX);
        self.current_page = page.clamp(1, upper.max(1));
        self.current_page
    }

    pub fn next(&mut self) -> u32 {
        self.go_to(self.current_page.saturating_add(1))
    }

    pub fn previous(&mut self) -> u32 {
        self.go_to(self.current_page.saturating_sub(1))
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.last_page.is_some_and(|last| self.current_page < last)
    }

    /// The page selector is only rendered when there is more than one page.
    pub fn is_visible(&self) -> bool {
        self.last_page.is_some_and(|last| last > 1)
    }

    /// Page selector for the given viewport width.
    pub fn window(&self, viewport_width_px: u32) -> Vec<PageItem> {
        let radius = Viewport::from_width(viewport_width_px).radius();
        page_window(self.current_page, self.last_page.unwrap_or(1), radius)
    }

    /// `(first, last, total)` positions for a "showing first to last of total" line.
    pub fn showing(&self) -> Option<(u64, u64, u64)> {
        let total = self.total?;
        let per_page = u64::from(self.per_page);
        let first = (u64::from(self.current_page) - 1) * per_page + 1;
        let last = (u64::from(self.current_page) * per_page).min(total);
        Some((first.min(total), last, total))
    }
}
