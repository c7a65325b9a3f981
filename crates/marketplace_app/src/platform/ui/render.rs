use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use marketplace_core::{BrowseViewModel, Category, FetchState, ListingRowView};

pub const HELP_TEXT: &str = "\
Commands:
  rent | sale     show places for rent or for sale
  more            load the next page
  help            show this list
  quit            leave";

pub fn render(view: &BrowseViewModel) -> String {
    let mut out = String::new();
    let Some(header) = view.header else {
        out.push_str("Choose a category: rent or sale\n");
        return out;
    };
    let _ = writeln!(out, "== {header} ==");

    for (index, row) in view.listings.iter().enumerate() {
        render_row(&mut out, index + 1, row);
    }

    if let Some(message) = &view.empty_message {
        let _ = writeln!(out, "{message}");
    }
    match view.fetch_state {
        FetchState::Loading if view.listings.is_empty() => out.push_str("Loading...\n"),
        FetchState::Loading => out.push_str("Loading more...\n"),
        FetchState::Idle | FetchState::Ready | FetchState::Failed => {}
    }
    if view.can_load_more {
        out.push_str("[more] Load More\n");
    }
    out
}

pub fn notice(message: &str) -> String {
    format!("! {message}")
}

fn render_row(out: &mut String, number: usize, row: &ListingRowView) {
    let name = row.name.as_deref().unwrap_or("Untitled listing");
    match &row.location {
        Some(location) => {
            let _ = writeln!(out, "{number:>3}. {name} ({location})");
        }
        None => {
            let _ = writeln!(out, "{number:>3}. {name}");
        }
    }

    let mut details = vec![price_label(row)];
    if let Some(bedrooms) = row.bedrooms {
        details.push(rooms_label(bedrooms, "Bedroom"));
    }
    if let Some(bathrooms) = row.bathrooms {
        details.push(rooms_label(bathrooms, "Bathroom"));
    }
    if let Some(date) = listed_date(row.listed_at_micros) {
        details.push(format!("listed {date}"));
    }
    let _ = writeln!(out, "     {}", details.join(" | "));

    if let Some(url) = &row.image_url {
        let _ = writeln!(out, "     {url}");
    }
}

fn price_label(row: &ListingRowView) -> String {
    let Some(price) = row.price else {
        return "Price on request".to_string();
    };
    let suffix = match row.category {
        Category::Rent => " / Month",
        Category::Sale => "",
    };
    format!("${}{suffix}", format_with_commas(price))
}

fn rooms_label(count: u32, noun: &str) -> String {
    if count > 1 {
        format!("{count} {noun}s")
    } else {
        format!("1 {noun}")
    }
}

fn listed_date(micros: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_micros(micros).map(|ts| ts.format("%Y-%m-%d").to_string())
}

fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
