use crate::domain::{
    ProgressBar, SessionData, SessionItem, branch_suffix, item_label, session_description,
    session_title, time_ago,
};
use crate::ui::format::{source_icon, status_color, status_icon};
use crate::ui::theme;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::time::SystemTime;

/// One session, laid out as lines; borders are added when drawn.
#[derive(Clone, Debug)]
pub struct CardView {
    pub key: String,
    pub header: Line<'static>,
    pub description: Option<Line<'static>>,
    pub rows: Vec<Line<'static>>,
}

impl CardView {
    pub fn height(&self) -> u16 {
        let body = 1 + usize::from(self.description.is_some()) + self.rows.len();
        u16::try_from(body.saturating_add(2)).unwrap_or(u16::MAX)
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(self.header.clone());
        if let Some(description) = &self.description {
            lines.push(description.clone());
        }
        lines.extend(self.rows.iter().cloned());
        lines
    }
}

pub fn compose_card(session: &SessionData, now: SystemTime) -> CardView {
    CardView {
        key: session.key(),
        header: header_line(session, now),
        description: session
            .meta
            .as_ref()
            .and_then(session_description)
            .map(|text| {
                Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(theme::MUTED)
                        .add_modifier(Modifier::ITALIC),
                ))
            }),
        rows: session.items.iter().map(item_row).collect(),
    }
}

fn header_line(session: &SessionData, now: SystemTime) -> Line<'static> {
    let bar = ProgressBar::for_session(session);

    let mut spans = vec![
        Span::raw(format!("{} ", source_icon(session.source))),
        Span::styled(
            session_title(session),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(branch) = session.meta.as_ref().and_then(branch_suffix) {
        spans.push(Span::styled(
            format!(" ({branch})"),
            Style::default().fg(theme::BRANCH),
        ));
    }

    spans.push(Span::raw("  "));
    spans.push(Span::styled(bar.filled_glyphs(), Style::default().fg(theme::PROGRESS_FILLED)));
    spans.push(Span::styled(bar.empty_glyphs(), Style::default().fg(theme::PROGRESS_EMPTY)));
    spans.push(Span::styled(
        format!(" {}", bar.fraction()),
        Style::default().fg(theme::FG),
    ));
    spans.push(Span::styled(
        format!("  · {}", time_ago(now, session.modified)),
        Style::default().fg(theme::MUTED),
    ));

    Line::from(spans)
}

pub fn item_row(item: &SessionItem) -> Line<'static> {
    let status = item.status();
    let label_style = if status.is_completed() {
        Style::default()
            .fg(theme::MUTED)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(theme::FG)
    };

    let mut spans = vec![
        Span::raw("  "),
        Span::styled(
            status_icon(status).to_string(),
            Style::default().fg(status_color(status)),
        ),
        Span::raw(" "),
        Span::styled(item_label(item), label_style),
    ];

    if let Some(owner) = item.owner() {
        spans.push(Span::styled(
            format!(" @{owner}"),
            Style::default().fg(theme::OWNER),
        ));
    }

    Line::from(spans)
}

/// Draws the card, cutting it at the bottom when `area` is shorter than the card.
pub fn render_card(frame: &mut Frame, area: Rect, card: &CardView) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(1));

    let paragraph = Paragraph::new(card.lines()).block(block);
    frame.render_widget(paragraph, area);
}
