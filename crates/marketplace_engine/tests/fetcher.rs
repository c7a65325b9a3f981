use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use marketplace_core::{append_page, Category, PageSize, ResultSet};
use marketplace_engine::{
    CollectionQuery, Direction, Document, FailureKind, FetchError, InMemoryStore,
    OrderedCollectionStore, PaginatedListingFetcher,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn doc(id: &str, category: &str, timestamp: i64) -> Document {
    Document {
        id: id.to_string(),
        fields: json!({ "type": category, "timestamp": timestamp, "name": id })
            .as_object()
            .cloned()
            .unwrap(),
        timestamp_fields: Vec::new(),
    }
}

fn page_size(size: usize) -> PageSize {
    PageSize::new(size).unwrap()
}

/// 15 rent listings keyed 1..=15 interleaved with sale listings.
fn scenario_store() -> Arc<InMemoryStore> {
    let mut docs = Vec::new();
    for key in 1..=15 {
        docs.push(doc(&format!("rent-{key:02}"), "rent", key));
        docs.push(doc(&format!("sale-{key:02}"), "sale", key * 100));
    }
    Arc::new(InMemoryStore::with_documents("listings", docs))
}

fn keys(page: &marketplace_core::Page) -> Vec<i64> {
    page.items.iter().map(|l| l.ordering_key).collect()
}

#[tokio::test]
async fn first_then_next_page_walks_rent_listings() {
    market_logging::initialize_for_tests();
    let fetcher = PaginatedListingFetcher::new(scenario_store());

    let first = fetcher
        .fetch_first_page(Category::Rent, page_size(10))
        .await
        .expect("first page");
    assert_eq!(keys(&first), (6..=15).rev().collect::<Vec<i64>>());
    let cursor = first.cursor.clone().expect("cursor after full page");
    assert_eq!(cursor.ordering_key(), 6);

    let second = fetcher
        .fetch_next_page(Category::Rent, page_size(10), &cursor)
        .await
        .expect("second page");
    assert_eq!(keys(&second), vec![5, 4, 3, 2, 1]);
    assert!(second.cursor.is_none());

    let results = append_page(append_page(ResultSet::new(), first), second);
    assert_eq!(results.len(), 15);
    assert!(results
        .items()
        .iter()
        .all(|l| l.category == Category::Rent));
}

#[tokio::test]
async fn short_collection_returns_everything_without_cursor() {
    let store = Arc::new(InMemoryStore::with_documents(
        "listings",
        vec![doc("a", "sale", 1), doc("b", "sale", 2), doc("c", "rent", 3)],
    ));
    let fetcher = PaginatedListingFetcher::new(store);

    let page = fetcher
        .fetch_first_page(Category::Sale, page_size(10))
        .await
        .unwrap();
    assert_eq!(keys(&page), vec![2, 1]);
    assert!(page.cursor.is_none());
}

#[tokio::test]
async fn exact_multiple_ends_with_empty_page() {
    let store = Arc::new(InMemoryStore::with_documents(
        "listings",
        (1..=4).map(|k| doc(&format!("r{k}"), "rent", k)),
    ));
    let fetcher = PaginatedListingFetcher::new(store);

    let first = fetcher
        .fetch_first_page(Category::Rent, page_size(2))
        .await
        .unwrap();
    let second = fetcher
        .fetch_next_page(Category::Rent, page_size(2), first.cursor.as_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(keys(&second), vec![2, 1]);

    let third = fetcher
        .fetch_next_page(Category::Rent, page_size(2), second.cursor.as_ref().unwrap())
        .await
        .unwrap();
    assert!(third.is_empty());
    assert!(third.cursor.is_none());
}

#[tokio::test]
async fn repeated_first_page_reads_are_identical() {
    let fetcher = PaginatedListingFetcher::new(scenario_store());

    let a = fetcher
        .fetch_first_page(Category::Sale, page_size(4))
        .await
        .unwrap();
    let b = fetcher
        .fetch_first_page(Category::Sale, page_size(4))
        .await
        .unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn equal_timestamps_are_split_by_id_without_loss() {
    let store = Arc::new(InMemoryStore::with_documents(
        "listings",
        vec![
            doc("a", "rent", 7),
            doc("b", "rent", 7),
            doc("c", "rent", 7),
            doc("d", "rent", 5),
        ],
    ));
    let fetcher = PaginatedListingFetcher::new(store);

    let first = fetcher
        .fetch_first_page(Category::Rent, page_size(2))
        .await
        .unwrap();
    let second = fetcher
        .fetch_next_page(Category::Rent, page_size(2), first.cursor.as_ref().unwrap())
        .await
        .unwrap();

    let ids: Vec<_> = first
        .items
        .iter()
        .chain(second.items.iter())
        .map(|l| l.id.as_str().to_string())
        .collect();
    assert_eq!(ids, vec!["c", "b", "a", "d"]);
}

#[test]
fn query_filters_by_category_and_orders_newest_first() {
    let fetcher = PaginatedListingFetcher::new(Arc::new(InMemoryStore::new()));
    let query = fetcher.query(Category::Rent, page_size(10), None);

    assert_eq!(query.collection, "listings");
    assert_eq!(query.filter.field, "type");
    assert_eq!(query.filter.value, "rent");
    assert_eq!(query.order_by.field, "timestamp");
    assert_eq!(query.order_by.direction, Direction::Descending);
    assert_eq!(query.limit, 10);
    assert!(query.start_after.is_none());
}

struct FlakyStore {
    inner: Arc<InMemoryStore>,
    failures_left: AtomicUsize,
    seen: Mutex<Vec<CollectionQuery>>,
}

#[async_trait::async_trait]
impl OrderedCollectionStore for FlakyStore {
    async fn query(&self, query: &CollectionQuery) -> Result<Vec<Document>, FetchError> {
        self.seen.lock().unwrap().push(query.clone());
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(FetchError::unavailable(FailureKind::Timeout, "simulated"));
        }
        self.inner.query(query).await
    }
}

#[tokio::test]
async fn store_failure_surfaces_as_unavailable() {
    let store = Arc::new(FlakyStore {
        inner: scenario_store(),
        failures_left: AtomicUsize::new(1),
        seen: Mutex::new(Vec::new()),
    });
    let fetcher = PaginatedListingFetcher::new(store.clone());

    let err = fetcher
        .fetch_first_page(Category::Rent, page_size(10))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Unavailable { .. }));
    assert_eq!(err.kind(), &FailureKind::Timeout);

    // The next attempt goes through unchanged.
    let page = fetcher
        .fetch_first_page(Category::Rent, page_size(10))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 10);
    let seen = store.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
}

/// Returns its rows verbatim, whatever the query.
struct VerbatimStore(Vec<Document>);

#[async_trait::async_trait]
impl OrderedCollectionStore for VerbatimStore {
    async fn query(&self, _query: &CollectionQuery) -> Result<Vec<Document>, FetchError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn undecodable_document_fails_the_fetch() {
    let broken = Document {
        id: "broken".to_string(),
        fields: json!({ "type": "rent" }).as_object().cloned().unwrap(),
        timestamp_fields: Vec::new(),
    };
    let fetcher =
        PaginatedListingFetcher::new(Arc::new(VerbatimStore(vec![doc("x", "rent", 1), broken])));

    let err = fetcher
        .fetch_first_page(Category::Rent, page_size(10))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), &FailureKind::MalformedResponse);
}

#[tokio::test]
async fn memory_store_skips_rows_without_sort_value() {
    let store = Arc::new(InMemoryStore::with_documents(
        "listings",
        vec![
            doc("ok", "rent", 1),
            Document {
                id: "undated".to_string(),
                fields: json!({ "type": "rent", "timestamp": "not a date" })
                    .as_object()
                    .cloned()
                    .unwrap(),
                timestamp_fields: Vec::new(),
            },
        ],
    ));
    assert_eq!(store.len(), 2);
    let fetcher = PaginatedListingFetcher::new(store);

    let page = fetcher
        .fetch_first_page(Category::Rent, page_size(10))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id.as_str(), "ok");
}
