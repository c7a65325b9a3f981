//! Marketplace core: listing model, cursor pagination primitives and the pure
//! category-view state machine.
mod effect;
mod listing;
mod msg;
mod page;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, FETCH_FAILED_NOTICE};
pub use listing::{
    Category, Cursor, KeyEncoding, Listing, ListingId, ListingPayload, ParseCategoryError,
};
pub use msg::Msg;
pub use page::{append_page, Page, PageSize, ResultSet, DEFAULT_PAGE_SIZE};
pub use state::{BrowseState, Epoch, FetchState, PageRequest};
pub use update::update;
pub use view_model::{BrowseViewModel, ListingRowView};
