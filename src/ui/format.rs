use crate::domain::{ItemStatus, SessionSource};
use ratatui::style::Color;

pub fn status_icon(status: &ItemStatus) -> &'static str {
    match status {
        ItemStatus::Completed => "✔",
        ItemStatus::InProgress => "◉",
        ItemStatus::Pending => "○",
        ItemStatus::Unknown(_) => "?",
    }
}

pub fn status_color(status: &ItemStatus) -> Color {
    match status {
        ItemStatus::Completed => Color::Green,
        ItemStatus::InProgress => Color::Yellow,
        ItemStatus::Pending => Color::Gray,
        ItemStatus::Unknown(_) => Color::White,
    }
}

pub fn source_icon(source: SessionSource) -> &'static str {
    match source {
        SessionSource::Todos => "📝",
        SessionSource::Tasks => "📋",
    }
}
