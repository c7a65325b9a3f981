use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use marketplace_core::{Category, Msg};
use thiserror::Error;

use super::app::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(Category),
    LoadMore,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command {0:?} (type `help` for the list)")]
pub struct UnknownCommand(pub String);

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, UnknownCommand> {
    let words: Vec<String> = line
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();

    let command = match words.as_slice() {
        [] => return Ok(None),
        ["more" | "m" | "next"] | ["load", "more"] => Command::LoadMore,
        ["help" | "h" | "?"] => Command::Help,
        ["quit" | "q" | "exit"] => Command::Quit,
        [word] | ["category" | "c", word] => match word.parse::<Category>() {
            Ok(category) => Command::Select(category),
            Err(_) => return Err(UnknownCommand(line.trim().to_string())),
        },
        _ => return Err(UnknownCommand(line.trim().to_string())),
    };
    Ok(Some(command))
}

impl Command {
    pub fn into_event(self) -> AppEvent {
        match self {
            Command::Select(category) => AppEvent::Msg(Msg::CategorySelected(category)),
            Command::LoadMore => AppEvent::Msg(Msg::LoadMoreClicked),
            Command::Help => AppEvent::Help,
            Command::Quit => AppEvent::Quit,
        }
    }
}

/// Reads stdin on a background thread; end of input quits the app.
pub fn spawn_stdin_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let event = match parse_command(&line) {
                Ok(Some(command)) => command.into_event(),
                Ok(None) => continue,
                Err(err) => AppEvent::InputRejected(err.to_string()),
            };
            let quit = matches!(event, AppEvent::Quit);
            if tx.send(event).is_err() || quit {
                return;
            }
        }
        let _ = tx.send(AppEvent::Quit);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_categories_and_aliases() {
        assert_eq!(
            parse_command("rent"),
            Ok(Some(Command::Select(Category::Rent)))
        );
        assert_eq!(
            parse_command("  Category SALE "),
            Ok(Some(Command::Select(Category::Sale)))
        );
        assert_eq!(parse_command("load more"), Ok(Some(Command::LoadMore)));
        assert_eq!(parse_command("m"), Ok(Some(Command::LoadMore)));
        assert_eq!(parse_command("q"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("?"), Ok(Some(Command::Help)));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn unknown_input_is_rejected() {
        assert_eq!(
            parse_command("buy house"),
            Err(UnknownCommand("buy house".to_string()))
        );
        assert!(parse_command("category lease").is_err());
    }

    #[test]
    fn commands_map_to_messages() {
        assert!(matches!(
            Command::LoadMore.into_event(),
            AppEvent::Msg(Msg::LoadMoreClicked)
        ));
        assert!(matches!(
            Command::Select(Category::Rent).into_event(),
            AppEvent::Msg(Msg::CategorySelected(Category::Rent))
        ));
    }
}
