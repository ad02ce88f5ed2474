mod card;
mod format;
mod theme;

use crate::app::{AppModel, WatchedLabels};
use crate::domain::SessionData;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::time::SystemTime;
use unicode_width::UnicodeWidthStr;

pub use card::{CardView, compose_card};
pub use format::status_icon;

pub const EMPTY_BOARD_MESSAGE: &str = "No active todos or tasks found.";

#[derive(Clone, Debug)]
pub enum BoardView {
    Placeholder(Vec<Line<'static>>),
    Cards(Vec<CardView>),
}

pub fn compose_board(
    sessions: &[SessionData],
    now: SystemTime,
    watched: &WatchedLabels,
) -> BoardView {
    if sessions.is_empty() {
        return BoardView::Placeholder(vec![
            Line::from(Span::styled(
                EMPTY_BOARD_MESSAGE,
                Style::default().fg(theme::FG),
            )),
            Line::from(Span::styled(
                format!("Watching {} and {}", watched.todos, watched.tasks),
                Style::default().fg(theme::MUTED),
            )),
        ]);
    }

    BoardView::Cards(
        sessions
            .iter()
            .map(|session| compose_card(session, now))
            .collect(),
    )
}

pub fn render(frame: &mut Frame, model: &AppModel, now: SystemTime) {
    let full_area = frame.area();
    if full_area.width == 0 || full_area.height == 0 {
        return;
    }

    let (board_area, footer_area) = if full_area.height > 1 {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(full_area);
        (chunks[0], Some(chunks[1]))
    } else {
        (full_area, None)
    };

    match compose_board(&model.data.sessions, now, &model.data.watched) {
        BoardView::Placeholder(lines) => render_placeholder(frame, board_area, lines),
        BoardView::Cards(cards) => render_cards(frame, board_area, &cards, model.scroll),
    }

    if let Some(footer_area) = footer_area {
        render_footer(frame, footer_area, model);
    }
}

fn render_placeholder(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let top = area.height.saturating_sub(height) / 2;
    let centered = Rect {
        x: area.x,
        y: area.y.saturating_add(top),
        width: area.width,
        height: height.min(area.height),
    };
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered,
    );
}

fn render_cards(frame: &mut Frame, area: Rect, cards: &[CardView], scroll: usize) {
    let bottom = area.y.saturating_add(area.height);
    let mut y = area.y;

    for card in cards.iter().skip(scroll) {
        if y >= bottom {
            break;
        }
        let height = card.height().min(bottom - y);
        let card_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height,
        };
        card::render_card(frame, card_area, card);
        y = y.saturating_add(height);
    }
}

fn render_footer(frame: &mut Frame, area: Rect, model: &AppModel) {
    let base_style = Style::default().fg(theme::FG).bg(theme::BAR_BG);
    let hint_style = Style::default().fg(theme::MUTED).bg(theme::BAR_BG);

    let total = model.data.sessions.len();
    let count = match total {
        0 => "no sessions".to_string(),
        1 => "1 session".to_string(),
        n => format!("{n} sessions"),
    };
    let position = if total > 1 {
        format!(" ({}/{total})", model.scroll.min(total - 1) + 1)
    } else {
        String::new()
    };

    let mut spans = vec![
        Span::styled(format!(" {count}{position}"), base_style),
        Span::styled("  ·  q quit  r rescan  ↑/↓ scroll".to_string(), hint_style),
    ];

    let warnings = model.data.warnings.get();
    if warnings > 0 {
        spans.push(Span::styled(
            format!("  ·  {warnings} unreadable"),
            Style::default().fg(theme::WARNING).bg(theme::BAR_BG),
        ));
    }

    if let Some(notice) = &model.notice {
        spans.push(Span::styled(format!("  ·  {notice}"), base_style));
    }

    let used: usize = spans
        .iter()
        .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
        .sum();
    let remaining = (area.width as usize).saturating_sub(used);
    spans.push(Span::styled(" ".repeat(remaining), base_style));

    frame.render_widget(Paragraph::new(Line::from(spans)).style(base_style), area);
}
