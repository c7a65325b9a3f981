use std::num::NonZeroUsize;

use crate::{Cursor, Listing};

/// Page size used by the category view when none is configured.
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize(match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// Returns `None` for zero.
    pub fn new(size: usize) -> Option<Self> {
        NonZeroUsize::new(size).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        DEFAULT_PAGE_SIZE
    }
}

/// One bounded batch of listings, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    pub items: Vec<Listing>,
    /// `None` once the collection is exhausted for this category.
    pub cursor: Option<Cursor>,
}

impl Page {
    /// Builds a page from the rows a store returned for a query limited to
    /// `page_size`. A short page carries no cursor.
    pub fn from_items(items: Vec<Listing>, page_size: PageSize) -> Self {
        let cursor = if items.len() >= page_size.get() {
            items.last().map(Cursor::after)
        } else {
            None
        };
        Self { items, cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Listings accumulated for the active category, in remote order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    items: Vec<Listing>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Listing] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Appends `page` to the end of `results`.
///
/// No de-duplication happens here: pages fetched through the cursor never
/// overlap, so the caller must simply not append the same page twice.
pub fn append_page(mut results: ResultSet, page: Page) -> ResultSet {
    results.items.extend(page.items);
    results
}
