use crate::{Category, Epoch, Page};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a category (re-selecting the current one reloads it).
    CategorySelected(Category),
    /// User clicked "Load More".
    LoadMoreClicked,
    /// Engine delivered a page for the request issued under `epoch`.
    PageLoaded { epoch: Epoch, page: Page },
    /// Engine could not fetch the page requested under `epoch`.
    PageFailed { epoch: Epoch },
}
