use std::cmp::Ordering;
use std::sync::RwLock;

use market_logging::market_trace;
use serde_json::Value;

use crate::decode::ordering_key_of;
use crate::{
    CollectionQuery, Direction, Document, FailureKind, FetchError, FilterOp,
    OrderedCollectionStore,
};

/// In-process store evaluating queries over a snapshot of documents.
///
/// Used for tests and for the demo data set of the terminal app.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<Vec<(String, Document)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(collection: &str, documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        for document in documents {
            store.insert(collection, document);
        }
        store
    }

    /// Adds or replaces a document by id.
    pub fn insert(&self, collection: &str, document: Document) {
        let mut rows = match self.collections.write() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        };
        rows.retain(|(name, existing)| !(name == collection && existing.id == document.id));
        rows.push((collection.to_string(), document));
    }

    pub fn len(&self) -> usize {
        self.collections.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl OrderedCollectionStore for InMemoryStore {
    async fn query(&self, query: &CollectionQuery) -> Result<Vec<Document>, FetchError> {
        let rows = self.collections.read().map_err(|_| {
            FetchError::unavailable(FailureKind::Network, "in-memory store lock poisoned")
        })?;

        let mut matched: Vec<(i64, &Document)> = Vec::new();
        for (collection, document) in rows.iter() {
            if collection != &query.collection || !matches_filter(document, query) {
                continue;
            }
            // Rows without a sort value are invisible to ordered queries.
            let Some(key) = document
                .fields
                .get(&query.order_by.field)
                .and_then(ordering_key_of)
            else {
                continue;
            };
            matched.push((key, document));
        }

        let direction = query.order_by.direction;
        matched.sort_by(|a, b| {
            compare_position(direction, (a.0, a.1.id.as_str()), (b.0, b.1.id.as_str()))
        });

        let result: Vec<Document> = matched
            .into_iter()
            .filter(|(key, document)| match &query.start_after {
                Some(cursor) => {
                    compare_position(
                        direction,
                        (*key, document.id.as_str()),
                        (cursor.ordering_key(), cursor.listing_id().as_str()),
                    ) == Ordering::Greater
                }
                None => true,
            })
            .take(query.limit)
            .map(|(_, document)| document.clone())
            .collect();

        market_trace!(
            "in-memory query on {} returned {} rows",
            query.collection,
            result.len()
        );
        Ok(result)
    }
}

fn matches_filter(document: &Document, query: &CollectionQuery) -> bool {
    let filter = &query.filter;
    match filter.op {
        FilterOp::Equal => {
            document.fields.get(&filter.field) == Some(&Value::String(filter.value.clone()))
        }
    }
}

/// Position order of two rows in `direction`; ties on the key fall back to
/// the id in the same direction.
fn compare_position(direction: Direction, a: (i64, &str), b: (i64, &str)) -> Ordering {
    let natural = a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1));
    match direction {
        Direction::Ascending => natural,
        Direction::Descending => natural.reverse(),
    }
}
