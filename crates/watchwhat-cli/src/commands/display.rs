use crate::output::Output;
use comfy_table::{Attribute, Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;
use watchwhat_models::{format_rating, format_year, Content, ContentSnapshot, Genre};

const OVERVIEW_WIDTH: usize = 80;

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan).add_attribute(Attribute::Bold)),
    );
    table
}

/// Spinner on an interactive terminal, hidden otherwise
pub fn spinner(message: &str) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.blue} {msg}")
        .map(|s| s.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.chars().count()).bright_cyan()));
}

pub fn print_content_table(items: &[Content], output: &Output) {
    if items.is_empty() {
        output.info("Nothing found");
        return;
    }

    let mut table = styled_table(&["ID", "Kind", "Title", "Year", "Rating"]);
    for item in items {
        table.add_row(vec![
            Cell::new(item.id()),
            Cell::new(item.kind()),
            Cell::new(item.display_title()),
            Cell::new(format_year(item.release_date())),
            Cell::new(format_rating(Some(item.vote_average()))),
        ]);
    }
    output.println(table.to_string());
}

pub fn print_snapshot_table<'a, I>(rows: I, extra_header: &str, output: &Output)
where
    I: IntoIterator<Item = (&'a ContentSnapshot, String)>,
{
    let mut table = styled_table(&["ID", "Kind", "Title", "Year", extra_header]);
    let mut empty = true;
    for (snapshot, extra) in rows {
        empty = false;
        table.add_row(vec![
            Cell::new(snapshot.id),
            Cell::new(snapshot.kind),
            Cell::new(&snapshot.title),
            Cell::new(format_year(snapshot.release_date.as_deref())),
            Cell::new(extra),
        ]);
    }

    if empty {
        output.info("Nothing here yet");
    } else {
        output.println(table.to_string());
    }
}

pub fn print_genre_table(genres: &[Genre], output: &Output) {
    let mut table = styled_table(&["ID", "Genre"]);
    for genre in genres {
        table.add_row(vec![Cell::new(genre.id), Cell::new(&genre.name)]);
    }
    output.println(table.to_string());
}

pub fn key_value_table(title: &str, rows: &[(&str, String)]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold),
    ]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

pub fn check_mark(enabled: bool) -> String {
    if enabled {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

/// Shorten to `width` characters, ending in an ellipsis when cut
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

pub fn overview(text: Option<&str>) -> String {
    match text {
        Some(t) if !t.trim().is_empty() => truncate(t.trim(), OVERVIEW_WIDTH * 3),
        _ => "No overview available".to_string(),
    }
}

pub fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
