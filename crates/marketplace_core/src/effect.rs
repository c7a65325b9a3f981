use crate::{Category, Cursor, Epoch, PageSize};

/// Fixed text shown to the user whenever a fetch fails.
pub const FETCH_FAILED_NOTICE: &str = "Could not fetch listings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchFirstPage {
        epoch: Epoch,
        category: Category,
        page_size: PageSize,
    },
    FetchNextPage {
        epoch: Epoch,
        category: Category,
        page_size: PageSize,
        cursor: Cursor,
    },
    /// Fire-and-forget, one per failed fetch.
    Notify { message: String },
}
