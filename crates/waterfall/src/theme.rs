use ratatui::style::{Color, Modifier, Style};
use waterfall_core::event::{is_failed, is_in_progress};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new().bg(Color::White).fg(Color::Black);
pub const ACTIVE_TAB_STYLE: Style = Style::new()
    .bg(Color::White)
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const TRACK_STYLE: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::DIM);
pub const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
pub const MUTED_STYLE: Style = Style::new().fg(Color::Gray);

pub const DARK_ORANGE: Color = Color::Rgb(214, 93, 14);
pub const ORANGE: Color = Color::Rgb(254, 128, 25);

pub mod glyphs {
    pub const PENDING: char = '□';
    pub const DONE: char = '■';
    pub const FAILED: char = '◩';
    pub const TRACK: char = '─';
    pub const OPERATION: &str = " ◯ ";
    pub const NO_OPERATION: &str = "   ";
}

pub fn status_glyph(status: &str) -> char {
    if is_in_progress(status) {
        glyphs::PENDING
    } else if is_failed(status) {
        glyphs::FAILED
    } else {
        glyphs::DONE
    }
}

/// Bar color by status family. Longer prefixes are checked before the ones they contain.
pub fn status_color(status: &str) -> Color {
    const FAMILIES: [(&str, Color); 8] = [
        ("UPDATE_ROLLBACK_", Color::Yellow),
        ("IMPORT_ROLLBACK_", DARK_ORANGE),
        ("CREATE_", Color::Green),
        ("DELETE_", Color::Red),
        ("UPDATE_", Color::Blue),
        ("IMPORT_", Color::Magenta),
        ("REVIEW_", Color::Gray),
        ("ROLLBACK_", ORANGE),
    ];
    FAMILIES
        .iter()
        .find(|(prefix, _)| status.starts_with(prefix))
        .map(|(_, color)| *color)
        .unwrap_or(Color::Reset)
}

pub fn bar_style(status: &str) -> Style {
    Style::new()
        .fg(status_color(status))
        .add_modifier(Modifier::BOLD)
}

/// Statuses listed in the help legend, in display order.
pub const LEGEND: [&str; 23] = [
    "CREATE_IN_PROGRESS",
    "CREATE_COMPLETE",
    "CREATE_FAILED",
    "DELETE_IN_PROGRESS",
    "DELETE_COMPLETE",
    "DELETE_FAILED",
    "REVIEW_IN_PROGRESS",
    "IMPORT_IN_PROGRESS",
    "IMPORT_COMPLETE",
    "ROLLBACK_IN_PROGRESS",
    "ROLLBACK_COMPLETE",
    "ROLLBACK_FAILED",
    "UPDATE_IN_PROGRESS",
    "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_COMPLETE",
    "UPDATE_FAILED",
    "UPDATE_ROLLBACK_IN_PROGRESS",
    "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_ROLLBACK_COMPLETE",
    "UPDATE_ROLLBACK_FAILED",
    "IMPORT_ROLLBACK_IN_PROGRESS",
    "IMPORT_ROLLBACK_COMPLETE",
    "IMPORT_ROLLBACK_FAILED",
];
