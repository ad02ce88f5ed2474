use crate::domain::{SessionData, SessionItem, SessionMeta};
use std::time::{Duration, SystemTime};

pub const PROGRESS_BAR_WIDTH: usize = 12;

const FILLED_GLYPH: &str = "█";
const EMPTY_GLYPH: &str = "░";
const DEFAULT_BRANCH: &str = "main";
const TITLE_ID_CHARS: usize = 8;
const PROMPT_PREVIEW_CHARS: usize = 60;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressBar {
    pub done: usize,
    pub total: usize,
    pub filled: usize,
}

impl ProgressBar {
    pub fn new(done: usize, total: usize) -> Self {
        let filled = if total == 0 {
            0
        } else {
            // round(done / total * width), half up, without floats.
            let scaled = done.saturating_mul(PROGRESS_BAR_WIDTH).saturating_mul(2);
            (scaled.saturating_add(total) / total.saturating_mul(2)).min(PROGRESS_BAR_WIDTH)
        };
        Self {
            done,
            total,
            filled,
        }
    }

    pub fn for_session(session: &SessionData) -> Self {
        Self::new(session.completed_count(), session.total_count())
    }

    pub fn empty(&self) -> usize {
        PROGRESS_BAR_WIDTH - self.filled
    }

    pub fn filled_glyphs(&self) -> String {
        FILLED_GLYPH.repeat(self.filled)
    }

    pub fn empty_glyphs(&self) -> String {
        EMPTY_GLYPH.repeat(self.empty())
    }

    pub fn fraction(&self) -> String {
        format!("{}/{}", self.done, self.total)
    }
}

pub fn time_ago(now: SystemTime, then: SystemTime) -> String {
    let elapsed = now.duration_since(then).unwrap_or(Duration::ZERO);
    format_elapsed(elapsed)
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    format!("{days}d ago")
}

pub fn session_title(session: &SessionData) -> String {
    if let Some(project) = session
        .meta
        .as_ref()
        .and_then(|meta| meta.project.as_deref())
        .filter(|project| !project.is_empty())
    {
        return project.to_string();
    }
    let short_id = session.id.chars().take(TITLE_ID_CHARS).collect::<String>();
    format!("{short_id}…")
}

pub fn branch_suffix(meta: &SessionMeta) -> Option<&str> {
    meta.git_branch
        .as_deref()
        .filter(|branch| !branch.is_empty() && *branch != DEFAULT_BRANCH)
}

pub fn session_description(meta: &SessionMeta) -> Option<String> {
    if let Some(summary) = meta.summary.as_deref().filter(|s| !s.is_empty()) {
        return Some(summary.to_string());
    }
    let prompt = meta.first_prompt.as_deref().filter(|s| !s.is_empty())?;
    let preview = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect::<String>();
    Some(format!("{preview}…"))
}

/// Rows a session's card occupies: header, optional description, one per item, two borders.
pub fn card_height(session: &SessionData) -> usize {
    let has_description = session
        .meta
        .as_ref()
        .and_then(session_description)
        .is_some();
    3 + usize::from(has_description) + session.items.len()
}

pub fn item_label(item: &SessionItem) -> String {
    match item {
        SessionItem::Task(task) => format!("#{} {}", task.id, task.subject),
        SessionItem::Todo(todo) => todo.content.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemStatus, SessionSource, TaskItem, TodoItem};

    fn glyphs(bar: ProgressBar) -> String {
        format!("{}{}", bar.filled_glyphs(), bar.empty_glyphs())
    }

    fn session(id: &str, meta: Option<SessionMeta>) -> SessionData {
        SessionData {
            id: id.to_string(),
            source: SessionSource::Todos,
            modified: SystemTime::UNIX_EPOCH,
            items: Vec::new(),
            meta,
        }
    }

    #[test]
    fn progress_bar_is_empty_when_total_is_zero() {
        let bar = ProgressBar::new(0, 0);
        assert_eq!(glyphs(bar), "░".repeat(12));
        assert_eq!(bar.fraction(), "0/0");
    }

    #[test]
    fn progress_bar_half_done() {
        let bar = ProgressBar::new(6, 12);
        assert_eq!(glyphs(bar), format!("{}{}", "█".repeat(6), "░".repeat(6)));
        assert_eq!(bar.fraction(), "6/12");
    }

    #[test]
    fn progress_bar_fully_done() {
        let bar = ProgressBar::new(12, 12);
        assert_eq!(glyphs(bar), "█".repeat(12));
        assert_eq!(bar.fraction(), "12/12");
    }

    #[test]
    fn progress_bar_rounds_to_nearest_unit() {
        // 1/3 * 12 = 4, 1/8 * 12 = 1.5 -> 2, 1/7 * 12 = 1.71 -> 2, 1/10 * 12 = 1.2 -> 1
        assert_eq!(ProgressBar::new(1, 3).filled, 4);
        assert_eq!(ProgressBar::new(1, 8).filled, 2);
        assert_eq!(ProgressBar::new(1, 7).filled, 2);
        assert_eq!(ProgressBar::new(1, 10).filled, 1);
        assert_eq!(glyphs(ProgressBar::new(1, 10)).chars().count(), 12);
    }

    #[test]
    fn elapsed_uses_largest_whole_unit() {
        assert_eq!(format_elapsed(Duration::from_secs(45)), "45s ago");
        assert_eq!(format_elapsed(Duration::from_secs(60)), "1m ago");
        assert_eq!(format_elapsed(Duration::from_secs(90)), "1m ago");
        assert_eq!(format_elapsed(Duration::from_secs(3661)), "1h ago");
        assert_eq!(format_elapsed(Duration::from_secs(90000)), "1d ago");
    }

    #[test]
    fn time_ago_clamps_future_timestamps() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let later = now + Duration::from_secs(30);
        assert_eq!(time_ago(now, later), "0s ago");
        assert_eq!(time_ago(now, SystemTime::UNIX_EPOCH), "1m ago");
    }

    #[test]
    fn title_prefers_project_name() {
        let meta = SessionMeta {
            project: Some("ccdash".to_string()),
            ..SessionMeta::default()
        };
        assert_eq!(session_title(&session("0123456789abcdef", Some(meta))), "ccdash");
        assert_eq!(session_title(&session("0123456789abcdef", None)), "01234567…");
        assert_eq!(session_title(&session("abc", None)), "abc…");
    }

    #[test]
    fn empty_project_name_falls_back_to_short_id() {
        let meta = SessionMeta {
            project: Some(String::new()),
            ..SessionMeta::default()
        };
        assert_eq!(session_title(&session("0123456789abcdef", Some(meta))), "01234567…");
    }

    #[test]
    fn card_height_counts_description_and_items() {
        let mut data = session("s", None);
        assert_eq!(card_height(&data), 3);

        data.items.push(SessionItem::Todo(TodoItem {
            content: "a".to_string(),
            status: ItemStatus::Pending,
        }));
        data.meta = Some(SessionMeta {
            summary: Some("Summary".to_string()),
            ..SessionMeta::default()
        });
        assert_eq!(card_height(&data), 5);

        data.meta = Some(SessionMeta {
            project: Some("p".to_string()),
            ..SessionMeta::default()
        });
        assert_eq!(card_height(&data), 4);
    }

    #[test]
    fn main_branch_is_never_shown() {
        let mut meta = SessionMeta {
            git_branch: Some("main".to_string()),
            ..SessionMeta::default()
        };
        assert_eq!(branch_suffix(&meta), None);
        meta.git_branch = Some(String::new());
        assert_eq!(branch_suffix(&meta), None);
        meta.git_branch = Some("feature/cards".to_string());
        assert_eq!(branch_suffix(&meta), Some("feature/cards"));
    }

    #[test]
    fn summary_wins_over_first_prompt() {
        let meta = SessionMeta {
            summary: Some("Fix the board".to_string()),
            first_prompt: Some("please fix".to_string()),
            ..SessionMeta::default()
        };
        assert_eq!(session_description(&meta).as_deref(), Some("Fix the board"));
    }

    #[test]
    fn first_prompt_is_cut_at_sixty_chars() {
        let prompt = "x".repeat(80);
        let meta = SessionMeta {
            first_prompt: Some(prompt),
            ..SessionMeta::default()
        };
        let description = session_description(&meta).expect("description");
        assert_eq!(description, format!("{}…", "x".repeat(60)));
        assert_eq!(session_description(&SessionMeta::default()), None);
    }

    #[test]
    fn item_label_depends_on_variant() {
        let task = SessionItem::Task(TaskItem {
            id: "3".to_string(),
            subject: "Wire watcher".to_string(),
            status: ItemStatus::Pending,
            owner: None,
        });
        let todo = SessionItem::Todo(TodoItem {
            content: "Write tests".to_string(),
            status: ItemStatus::Completed,
        });
        assert_eq!(item_label(&task), "#3 Wire watcher");
        assert_eq!(item_label(&todo), "Write tests");
    }
}
