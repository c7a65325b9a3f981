use std::io;
use std::sync::mpsc;
use std::thread;

use market_logging::{market_info, market_warn};
use marketplace_core::{Effect, Epoch, Msg};
use marketplace_engine::{EngineEvent, EngineHandle, EngineStopped, PaginatedListingFetcher};

use super::app::AppEvent;

pub struct EffectRunner {
    engine: EngineHandle,
    app_tx: mpsc::Sender<AppEvent>,
}

impl EffectRunner {
    pub fn new(fetcher: PaginatedListingFetcher, app_tx: mpsc::Sender<AppEvent>) -> io::Result<Self> {
        let (event_tx, event_rx) = mpsc::channel();
        let engine = EngineHandle::new(fetcher, event_tx)?;
        spawn_event_loop(event_rx, app_tx.clone());
        Ok(Self { engine, app_tx })
    }

    /// Starts fetch effects and returns the notices to show the user.
    ///
    /// A fetch the engine refuses is reported back to the loop as
    /// `PageFailed`, so the view never waits on it.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<String> {
        let mut notices = Vec::new();
        for effect in effects {
            match effect {
                Effect::FetchFirstPage {
                    epoch,
                    category,
                    page_size,
                } => {
                    market_info!(
                        "FetchFirstPage epoch={} category={} page_size={}",
                        epoch,
                        category,
                        page_size.get()
                    );
                    let started = self.engine.fetch_first_page(epoch, category, page_size);
                    self.report_refusal(epoch, started);
                }
                Effect::FetchNextPage {
                    epoch,
                    category,
                    page_size,
                    cursor,
                } => {
                    market_info!(
                        "FetchNextPage epoch={} category={} after={}",
                        epoch,
                        category,
                        cursor.listing_id()
                    );
                    let started = self
                        .engine
                        .fetch_next_page(epoch, category, page_size, cursor);
                    self.report_refusal(epoch, started);
                }
                Effect::Notify { message } => notices.push(message),
            }
        }
        notices
    }

    /// Stops the engine once running fetches finish.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    fn report_refusal(&self, epoch: Epoch, started: Result<(), EngineStopped>) {
        if let Err(err) = started {
            market_warn!("fetch for epoch {} not started: {}", epoch, err);
            let _ = self.app_tx.send(AppEvent::Msg(Msg::PageFailed { epoch }));
        }
    }
}

fn spawn_event_loop(event_rx: mpsc::Receiver<EngineEvent>, app_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            if app_tx.send(AppEvent::Msg(event_to_msg(event))).is_err() {
                break;
            }
        }
    });
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PageFetched {
            epoch,
            request,
            result,
        } => match result {
            Ok(page) => Msg::PageLoaded { epoch, page },
            Err(err) => {
                market_warn!("{:?} page fetch failed (epoch {}): {}", request, epoch, err);
                Msg::PageFailed { epoch }
            }
        },
    }
}
