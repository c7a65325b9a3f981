use market_logging::{market_debug, market_trace};

use crate::{BrowseState, Effect, Msg, FETCH_FAILED_NOTICE};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: BrowseState, msg: Msg) -> (BrowseState, Vec<Effect>) {
    let effects = match msg {
        Msg::CategorySelected(category) => {
            let epoch = state.select_category(category);
            vec![Effect::FetchFirstPage {
                epoch,
                category,
                page_size: state.page_size(),
            }]
        }
        Msg::LoadMoreClicked => match state.begin_next_page() {
            Some((epoch, category, cursor)) => vec![Effect::FetchNextPage {
                epoch,
                category,
                page_size: state.page_size(),
                cursor,
            }],
            None => {
                market_trace!(
                    "load more ignored in state {:?} (cursor present: {})",
                    state.fetch_state(),
                    state.cursor().is_some()
                );
                Vec::new()
            }
        },
        Msg::PageLoaded { epoch, page } => {
            if !state.accepts(epoch) {
                market_debug!(
                    "discarding stale page: epoch={} current={} items={}",
                    epoch,
                    state.epoch(),
                    page.items.len()
                );
                return (state, Vec::new());
            }
            state.apply_page(page);
            Vec::new()
        }
        Msg::PageFailed { epoch } => {
            if !state.accepts(epoch) {
                market_debug!(
                    "discarding stale failure: epoch={} current={}",
                    epoch,
                    state.epoch()
                );
                return (state, Vec::new());
            }
            state.apply_failure();
            vec![Effect::Notify {
                message: FETCH_FAILED_NOTICE.to_string(),
            }]
        }
    };

    (state, effects)
}
