use crate::page::append_page;
use crate::view_model::{BrowseViewModel, ListingRowView};
use crate::{Category, Cursor, Page, PageSize, ResultSet};

/// Generation counter bumped on every category selection. Completions
/// carrying an older epoch belong to a view that no longer exists.
pub type Epoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    First,
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BrowseState {
    page_size: PageSize,
    category: Option<Category>,
    epoch: Epoch,
    fetch_state: FetchState,
    in_flight: Option<PageRequest>,
    results: ResultSet,
    cursor: Option<Cursor>,
    dirty: bool,
}

impl BrowseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    pub fn in_flight(&self) -> Option<PageRequest> {
        self.in_flight
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn can_load_more(&self) -> bool {
        self.fetch_state == FetchState::Ready && self.cursor.is_some()
    }

    pub fn view(&self) -> BrowseViewModel {
        let empty_message = match (self.category, self.fetch_state) {
            (Some(category), FetchState::Ready | FetchState::Failed)
                if self.results.is_empty() =>
            {
                Some(format!("No listings for {category}"))
            }
            _ => None,
        };

        BrowseViewModel {
            category: self.category,
            header: self.category.map(header_for),
            fetch_state: self.fetch_state,
            listings: self
                .results
                .items()
                .iter()
                .map(ListingRowView::from_listing)
                .collect(),
            can_load_more: self.can_load_more(),
            empty_message,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Discards the current results and starts a first-page request for
    /// `category` under a fresh epoch.
    pub(crate) fn select_category(&mut self, category: Category) -> Epoch {
        self.epoch += 1;
        self.category = Some(category);
        self.results = ResultSet::new();
        self.cursor = None;
        self.fetch_state = FetchState::Loading;
        self.in_flight = Some(PageRequest::First);
        self.dirty = true;
        self.epoch
    }

    /// Moves `Ready` to `Loading` for the next page. Returns `None` while a
    /// request is in flight or once the category is exhausted.
    pub(crate) fn begin_next_page(&mut self) -> Option<(Epoch, Category, Cursor)> {
        if !self.can_load_more() {
            return None;
        }
        let category = self.category?;
        let cursor = self.cursor.clone()?;
        self.fetch_state = FetchState::Loading;
        self.in_flight = Some(PageRequest::Next);
        self.dirty = true;
        Some((self.epoch, category, cursor))
    }

    /// True when a completion tagged with `epoch` answers the request
    /// currently in flight.
    pub(crate) fn accepts(&self, epoch: Epoch) -> bool {
        epoch == self.epoch && self.in_flight.is_some()
    }

    pub(crate) fn apply_page(&mut self, page: Page) {
        self.in_flight = None;
        self.cursor = page.cursor.clone();
        self.results = append_page(std::mem::take(&mut self.results), page);
        self.fetch_state = FetchState::Ready;
        self.dirty = true;
    }

    /// Results and cursor are left untouched; only the state moves.
    pub(crate) fn apply_failure(&mut self) {
        self.fetch_state = match self.in_flight.take() {
            Some(PageRequest::Next) => FetchState::Ready,
            Some(PageRequest::First) | None => FetchState::Failed,
        };
        self.dirty = true;
    }
}

fn header_for(category: Category) -> &'static str {
    match category {
        Category::Rent => "Places for rent",
        Category::Sale => "Places for sale",
    }
}
