mod reload;

use crate::domain::{SessionData, card_height};
use crate::infra::{BoardPaths, LoadWarningCount, display_path};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

pub use reload::ReloadSchedule;

/// Page step before the first terminal size is known.
const PAGE_CARDS: usize = 5;
/// Footer row below the board.
const FOOTER_ROWS: u16 = 1;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ResolvePaths(#[from] crate::infra::ResolveBoardPathsError),
}

/// Names of the two watched locations, as shown in the empty-board message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WatchedLabels {
    pub todos: String,
    pub tasks: String,
}

impl Default for WatchedLabels {
    fn default() -> Self {
        Self {
            todos: "~/.claude/todos/".to_string(),
            tasks: "~/.claude/tasks/".to_string(),
        }
    }
}

impl WatchedLabels {
    pub fn from_paths(paths: &BoardPaths) -> Self {
        Self {
            todos: display_path(&paths.todos_dir),
            tasks: display_path(&paths.tasks_dir),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoardData {
    pub paths: BoardPaths,
    pub watched: WatchedLabels,
    pub sessions: Vec<SessionData>,
    pub warnings: LoadWarningCount,
}

impl BoardData {
    pub fn from_load(
        paths: BoardPaths,
        sessions: Vec<SessionData>,
        warnings: LoadWarningCount,
    ) -> Self {
        let watched = WatchedLabels::from_paths(&paths);
        Self {
            paths,
            watched,
            sessions,
            warnings,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub data: BoardData,
    /// Index of the first visible card.
    pub scroll: usize,
    pub terminal_size: (u16, u16),
    pub notice: Option<String>,
}

impl AppModel {
    pub fn new(data: BoardData) -> Self {
        Self {
            data,
            scroll: 0,
            terminal_size: (0, 0),
            notice: None,
        }
    }

    /// Swaps in a fresh snapshot, keeping the same session at the top when it survived.
    pub fn with_data(&self, data: BoardData) -> Self {
        let anchor = self.data.sessions.get(self.scroll).map(SessionData::key);
        let scroll = anchor
            .and_then(|key| data.sessions.iter().position(|s| s.key() == key))
            .unwrap_or_else(|| self.scroll.min(data.sessions.len().saturating_sub(1)));

        Self {
            data,
            scroll,
            terminal_size: self.terminal_size,
            notice: self.notice.clone(),
        }
    }

    pub fn with_terminal_size(&self, width: u16, height: u16) -> Self {
        Self {
            terminal_size: (width, height),
            ..self.clone()
        }
    }

    pub fn with_notice(&self, notice: Option<String>) -> Self {
        Self {
            notice,
            ..self.clone()
        }
    }

    fn max_scroll(&self) -> usize {
        self.data.sessions.len().saturating_sub(1)
    }

    /// Whole cards that fit on the board starting at the top card; at least one.
    fn page_cards(&self) -> usize {
        let (_, height) = self.terminal_size;
        if height == 0 {
            return PAGE_CARDS;
        }
        let board_rows = usize::from(height.saturating_sub(FOOTER_ROWS));

        let mut used = 0usize;
        let mut fits = 0usize;
        for session in self.data.sessions.iter().skip(self.scroll) {
            used += card_height(session);
            if used > board_rows {
                break;
            }
            fits += 1;
        }
        fits.max(1)
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Rescan,
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Resize(width, height) => {
            (model.with_terminal_size(width, height), AppCommand::None)
        }
    }
}

fn update_on_key(model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let mut model = model;
    model.notice = None;

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => (model, AppCommand::Quit),
            KeyCode::Char('r') => (model, AppCommand::Rescan),
            _ => (model, AppCommand::None),
        };
    }

    let max_scroll = model.max_scroll();
    let page = model.page_cards();
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return (model, AppCommand::Quit),
        KeyCode::Char('r') => return (model, AppCommand::Rescan),
        KeyCode::Down | KeyCode::Char('j') => {
            model.scroll = model.scroll.saturating_add(1).min(max_scroll);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            model.scroll = model.scroll.saturating_sub(1);
        }
        KeyCode::PageDown => {
            model.scroll = model.scroll.saturating_add(page).min(max_scroll);
        }
        KeyCode::PageUp => {
            model.scroll = model.scroll.saturating_sub(page);
        }
        KeyCode::Home | KeyCode::Char('g') => {
            model.scroll = 0;
        }
        KeyCode::End | KeyCode::Char('G') => {
            model.scroll = max_scroll;
        }
        _ => {}
    }

    (model, AppCommand::None)
}
