use std::io;
use std::sync::mpsc;
use std::thread;

use market_logging::{market_debug, market_warn};
use marketplace_core::{Category, Cursor, Epoch, PageRequest, PageSize};
use thiserror::Error;
use tokio::sync::mpsc as async_mpsc;
use tokio::task::JoinSet;

use crate::{EngineEvent, FailureKind, FetchError, PaginatedListingFetcher};

enum EngineCommand {
    FirstPage {
        epoch: Epoch,
        category: Category,
        page_size: PageSize,
    },
    NextPage {
        epoch: Epoch,
        category: Category,
        page_size: PageSize,
        cursor: Cursor,
    },
    Shutdown,
}

/// Returned when a fetch is requested after the engine worker has stopped.
/// No event will arrive for that fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("listing engine is not running")]
pub struct EngineStopped;

/// Runs fetches on a single-threaded runtime owned by a background thread.
///
/// Completions are sent to the event channel in the order they finish.
/// Every accepted fetch produces exactly one event: once the worker is
/// asked to stop it lets running fetches finish and answers commands still
/// queued with a `Stopped` failure. Requests made after that are refused
/// with [`EngineStopped`].
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        fetcher: PaginatedListingFetcher,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel::<EngineCommand>();

        thread::Builder::new()
            .name("listing-engine".to_string())
            .spawn(move || {
                runtime.block_on(run_worker(fetcher, cmd_rx, event_tx));
                market_debug!("listing engine stopped");
            })?;

        Ok(Self { cmd_tx })
    }

    pub fn fetch_first_page(
        &self,
        epoch: Epoch,
        category: Category,
        page_size: PageSize,
    ) -> Result<(), EngineStopped> {
        self.send(EngineCommand::FirstPage {
            epoch,
            category,
            page_size,
        })
    }

    pub fn fetch_next_page(
        &self,
        epoch: Epoch,
        category: Category,
        page_size: PageSize,
        cursor: Cursor,
    ) -> Result<(), EngineStopped> {
        self.send(EngineCommand::NextPage {
            epoch,
            category,
            page_size,
            cursor,
        })
    }

    /// Asks the worker to stop after the fetches already running.
    pub fn shutdown(&self) {
        let _ = self.send(EngineCommand::Shutdown);
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineStopped> {
        self.cmd_tx.send(command).map_err(|_| {
            market_warn!("listing engine is not running; fetch refused");
            EngineStopped
        })
    }
}

async fn run_worker(
    fetcher: PaginatedListingFetcher,
    mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let mut running = JoinSet::new();
    while let Some(command) = cmd_rx.recv().await {
        while running.try_join_next().is_some() {}
        if matches!(command, EngineCommand::Shutdown) {
            break;
        }
        let fetcher = fetcher.clone();
        let event_tx = event_tx.clone();
        running.spawn(async move {
            handle_command(&fetcher, command, event_tx).await;
        });
    }

    // Refuse new commands, then answer the ones already queued.
    cmd_rx.close();
    while let Ok(command) = cmd_rx.try_recv() {
        if let Some(event) = stopped_event(command) {
            let _ = event_tx.send(event);
        }
    }
    while running.join_next().await.is_some() {}
}

fn stopped_event(command: EngineCommand) -> Option<EngineEvent> {
    let (epoch, request) = match command {
        EngineCommand::FirstPage { epoch, .. } => (epoch, PageRequest::First),
        EngineCommand::NextPage { epoch, .. } => (epoch, PageRequest::Next),
        EngineCommand::Shutdown => return None,
    };
    Some(EngineEvent::PageFetched {
        epoch,
        request,
        result: Err(FetchError::unavailable(
            FailureKind::Stopped,
            "listing engine stopped before the fetch started",
        )),
    })
}

async fn handle_command(
    fetcher: &PaginatedListingFetcher,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::FirstPage {
            epoch,
            category,
            page_size,
        } => EngineEvent::PageFetched {
            epoch,
            request: PageRequest::First,
            result: fetcher.fetch_first_page(category, page_size).await,
        },
        EngineCommand::NextPage {
            epoch,
            category,
            page_size,
            cursor,
        } => EngineEvent::PageFetched {
            epoch,
            request: PageRequest::Next,
            result: fetcher.fetch_next_page(category, page_size, &cursor).await,
        },
        EngineCommand::Shutdown => return,
    };
    let _ = event_tx.send(event);
}
