use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::Context;
use log::LevelFilter;
use market_logging::{market_info, DEFAULT_LOG_FILE};
use marketplace_core::{update, BrowseState, Msg};
use marketplace_engine::PaginatedListingFetcher;

use super::effects::EffectRunner;
use super::{config, input, ui};

/// Everything the main loop reacts to, from stdin or from the engine.
#[derive(Debug)]
pub enum AppEvent {
    Msg(Msg),
    Help,
    InputRejected(String),
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let loaded = config::load(config_path.as_deref()).context("loading configuration")?;
    market_logging::initialize(
        loaded.config.log,
        LevelFilter::Info,
        Path::new(DEFAULT_LOG_FILE),
    );
    match &loaded.source {
        Some(path) => market_info!("configuration loaded from {:?}", path),
        None => market_info!("no {} found, using defaults", config::DEFAULT_CONFIG_FILENAME),
    }

    let page_size = loaded.config.page_size()?;
    let store = config::build_store(&loaded.config).context("building listing store")?;
    let fetcher = PaginatedListingFetcher::with_layout(store, loaded.config.layout.clone());

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(fetcher, tx.clone()).context("starting listing engine")?;
    input::spawn_stdin_reader(tx);

    let mut out = io::stdout();
    writeln!(out, "{}", ui::render::HELP_TEXT)?;

    let mut state = BrowseState::with_page_size(page_size);
    while let Ok(event) = rx.recv() {
        match event {
            AppEvent::Msg(msg) => {
                state = dispatch(state, msg, &runner, &mut out)?;
            }
            AppEvent::Help => writeln!(out, "{}", ui::render::HELP_TEXT)?,
            AppEvent::InputRejected(reason) => writeln!(out, "{}", ui::render::notice(&reason))?,
            AppEvent::Quit => break,
        }
        out.flush()?;
    }

    runner.shutdown();
    market_info!("marketplace app exiting");
    Ok(())
}

fn dispatch(
    state: BrowseState,
    msg: Msg,
    runner: &EffectRunner,
    out: &mut impl Write,
) -> io::Result<BrowseState> {
    let (mut state, effects) = update(state, msg);
    for message in runner.enqueue(effects) {
        writeln!(out, "{}", ui::render::notice(&message))?;
    }
    if state.consume_dirty() {
        write!(out, "{}", ui::render::render(&state.view()))?;
    }
    Ok(state)
}
