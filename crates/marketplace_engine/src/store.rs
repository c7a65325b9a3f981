use marketplace_core::Cursor;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::FetchError;

/// Read-only access to a remote collection with filtered, ordered,
/// cursor-bounded range queries.
///
/// Rows sharing an ordering value are ordered by document id in the same
/// direction as the ordering field, so a cursor names a unique position.
#[async_trait::async_trait]
pub trait OrderedCollectionStore: Send + Sync {
    async fn query(&self, query: &CollectionQuery) -> Result<Vec<Document>, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub collection: String,
    pub filter: FieldFilter,
    pub order_by: OrderBy,
    pub limit: usize,
    /// Exclusive: rows at or before this position are skipped.
    pub start_after: Option<Cursor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One stored row: the store-assigned id plus its plain JSON fields.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Top-level fields the store holds as native timestamps. Their values
    /// appear in `fields` as RFC 3339 strings.
    #[serde(default)]
    pub timestamp_fields: Vec<String>,
}

/// Where listings live and which fields carry the category and sort key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectionLayout {
    pub collection: String,
    pub category_field: String,
    pub ordering_field: String,
}

impl Default for CollectionLayout {
    fn default() -> Self {
        Self {
            collection: "listings".to_string(),
            category_field: "type".to_string(),
            ordering_field: "timestamp".to_string(),
        }
    }
}
