//! Marketplace engine: listing stores, the paginated fetcher and effect
//! execution.
mod decode;
mod engine;
mod fetcher;
mod firestore;
mod memory;
mod store;
mod types;

pub use decode::{decode_listing, ordering_key_of};
pub use engine::{EngineHandle, EngineStopped};
pub use fetcher::PaginatedListingFetcher;
pub use firestore::{FirestoreSettings, FirestoreStore};
pub use memory::InMemoryStore;
pub use store::{
    CollectionLayout, CollectionQuery, Direction, Document, FieldFilter, FilterOp, OrderBy,
    OrderedCollectionStore,
};
pub use types::{EngineEvent, FailureKind, FetchError};
