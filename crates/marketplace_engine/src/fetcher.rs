use std::sync::Arc;

use market_logging::market_info;
use marketplace_core::{Category, Cursor, Page, PageSize};

use crate::decode::decode_listing;
use crate::{
    CollectionLayout, CollectionQuery, Direction, FetchError, FieldFilter, FilterOp, OrderBy,
    OrderedCollectionStore,
};

/// Fetches category pages, newest first, from an injected store.
#[derive(Clone)]
pub struct PaginatedListingFetcher {
    store: Arc<dyn OrderedCollectionStore>,
    layout: CollectionLayout,
}

impl PaginatedListingFetcher {
    pub fn new(store: Arc<dyn OrderedCollectionStore>) -> Self {
        Self::with_layout(store, CollectionLayout::default())
    }

    pub fn with_layout(store: Arc<dyn OrderedCollectionStore>, layout: CollectionLayout) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &CollectionLayout {
        &self.layout
    }

    /// Newest `page_size` listings of `category`. The page has no cursor when
    /// fewer than `page_size` listings exist.
    pub async fn fetch_first_page(
        &self,
        category: Category,
        page_size: PageSize,
    ) -> Result<Page, FetchError> {
        self.fetch(category, page_size, None).await
    }

    /// Listings strictly after `cursor`. The cursor must come from a page
    /// of the same category; this is not checked.
    pub async fn fetch_next_page(
        &self,
        category: Category,
        page_size: PageSize,
        cursor: &Cursor,
    ) -> Result<Page, FetchError> {
        self.fetch(category, page_size, Some(cursor.clone())).await
    }

    pub fn query(
        &self,
        category: Category,
        page_size: PageSize,
        start_after: Option<Cursor>,
    ) -> CollectionQuery {
        CollectionQuery {
            collection: self.layout.collection.clone(),
            filter: FieldFilter {
                field: self.layout.category_field.clone(),
                op: FilterOp::Equal,
                value: category.as_str().to_string(),
            },
            order_by: OrderBy {
                field: self.layout.ordering_field.clone(),
                direction: Direction::Descending,
            },
            limit: page_size.get(),
            start_after,
        }
    }

    async fn fetch(
        &self,
        category: Category,
        page_size: PageSize,
        start_after: Option<Cursor>,
    ) -> Result<Page, FetchError> {
        let continuing = start_after.is_some();
        let query = self.query(category, page_size, start_after);
        let documents = self.store.query(&query).await?;

        let items = documents
            .iter()
            .map(|document| decode_listing(document, &self.layout))
            .collect::<Result<Vec<_>, _>>()?;
        let page = Page::from_items(items, page_size);

        market_info!(
            "fetched {} {} listings (next page: {}, exhausted: {})",
            page.items.len(),
            category,
            continuing,
            page.is_last()
        );
        Ok(page)
    }
}
