use crate::domain::{
    SessionData, SessionItem, SessionMeta, SessionSource, TaskItem, parse_sessions_index,
    parse_task_file, parse_todo_file, todo_session_id,
};
use crate::infra::BoardPaths;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadWarningCount(usize);

impl From<usize> for LoadWarningCount {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl LoadWarningCount {
    pub fn get(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct LoadOutput {
    pub sessions: Vec<SessionData>,
    pub warnings: LoadWarningCount,
    pub notice: Option<String>,
}

pub fn load_sessions(paths: &BoardPaths) -> LoadOutput {
    let mut warnings = 0usize;
    let mut missing: Vec<String> = Vec::new();

    let meta = load_session_meta(&paths.projects_dir);

    let mut sessions = Vec::new();
    match load_todo_sessions(&paths.todos_dir) {
        Some(output) => {
            warnings += output.warnings;
            sessions.extend(output.sessions);
        }
        None => missing.push(paths.todos_dir.display().to_string()),
    }
    match load_task_sessions(&paths.tasks_dir) {
        Some(output) => {
            warnings += output.warnings;
            sessions.extend(output.sessions);
        }
        None => missing.push(paths.tasks_dir.display().to_string()),
    }

    for session in &mut sessions {
        session.meta = meta.get(&session.id).cloned();
    }

    sessions.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.key().cmp(&b.key()))
    });

    debug!(
        sessions = sessions.len(),
        warnings, "loaded todo and task sessions"
    );

    let notice = if missing.is_empty() {
        None
    } else {
        Some(format!("Not found: {}", missing.join(", ")))
    };

    LoadOutput {
        sessions,
        warnings: LoadWarningCount::from(warnings),
        notice,
    }
}

struct SourceOutput {
    sessions: Vec<SessionData>,
    warnings: usize,
}

/// `None` when the directory does not exist.
fn load_todo_sessions(todos_dir: &Path) -> Option<SourceOutput> {
    let entries = fs::read_dir(todos_dir).ok()?;

    let mut warnings = 0usize;
    let mut by_id: HashMap<String, SessionData> = HashMap::new();

    for entry in entries {
        let Ok(entry) = entry else {
            warnings += 1;
            continue;
        };
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let parsed = fs::read_to_string(&path)
            .map_err(|error| error.to_string())
            .and_then(|text| parse_todo_file(&text).map_err(|error| error.to_string()));
        let todos = match parsed {
            Ok(todos) => todos,
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable todo file");
                warnings += 1;
                continue;
            }
        };
        if todos.is_empty() {
            continue;
        }

        let modified = modified_time(&path);
        let session_id = todo_session_id(stem).to_string();
        let newer = by_id
            .get(&session_id)
            .is_none_or(|existing| modified > existing.modified);
        if newer {
            by_id.insert(
                session_id.clone(),
                SessionData {
                    id: session_id,
                    source: SessionSource::Todos,
                    modified,
                    items: todos.into_iter().map(SessionItem::Todo).collect(),
                    meta: None,
                },
            );
        }
    }

    Some(SourceOutput {
        sessions: by_id.into_values().collect(),
        warnings,
    })
}

/// `None` when the directory does not exist.
fn load_task_sessions(tasks_dir: &Path) -> Option<SourceOutput> {
    if !tasks_dir.is_dir() {
        return None;
    }

    let mut warnings = 0usize;
    let mut by_id: HashMap<String, (SystemTime, Vec<TaskItem>)> = HashMap::new();

    let walker = WalkDir::new(tasks_dir)
        .min_depth(2)
        .max_depth(2)
        .follow_links(false)
        .into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_error) => {
                warnings += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(session_id) = path
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
        else {
            continue;
        };

        let parsed = fs::read_to_string(path)
            .map_err(|error| error.to_string())
            .and_then(|text| parse_task_file(&text).map_err(|error| error.to_string()));
        let task = match parsed {
            Ok(task) => task,
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable task file");
                warnings += 1;
                continue;
            }
        };

        let modified = modified_time(path);
        let slot = by_id
            .entry(session_id.to_string())
            .or_insert_with(|| (modified, Vec::new()));
        slot.0 = slot.0.max(modified);
        slot.1.push(task);
    }

    let sessions = by_id
        .into_iter()
        .map(|(id, (modified, mut tasks))| {
            tasks.sort_by(compare_task_ids);
            SessionData {
                id,
                source: SessionSource::Tasks,
                modified,
                items: tasks.into_iter().map(SessionItem::Task).collect(),
                meta: None,
            }
        })
        .collect();

    Some(SourceOutput { sessions, warnings })
}

pub fn load_session_meta(projects_dir: &Path) -> HashMap<String, SessionMeta> {
    let mut out = HashMap::new();
    let Ok(entries) = fs::read_dir(projects_dir) else {
        return out;
    };

    for entry in entries.flatten() {
        let index_path = entry.path().join("sessions-index.json");
        let Ok(text) = fs::read_to_string(&index_path) else {
            continue;
        };
        match parse_sessions_index(&text) {
            Ok(parsed) => out.extend(parsed),
            Err(error) => {
                warn!(path = %index_path.display(), %error, "skipping sessions index");
            }
        }
    }

    out
}

fn compare_task_ids(a: &TaskItem, b: &TaskItem) -> std::cmp::Ordering {
    match (a.id.parse::<u64>(), b.id.parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.id.cmp(&b.id),
    }
}

fn modified_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemStatus;
    use std::fs::File;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::tempdir;

    fn board_paths(root: &Path) -> BoardPaths {
        BoardPaths {
            todos_dir: root.join("todos"),
            tasks_dir: root.join("tasks"),
            projects_dir: root.join("projects"),
        }
    }

    fn write(path: PathBuf, text: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, text).expect("write");
    }

    #[test]
    fn missing_dirs_yield_empty_board_with_notice() {
        let dir = tempdir().expect("tempdir");
        let output = load_sessions(&board_paths(dir.path()));
        assert!(output.sessions.is_empty());
        assert_eq!(output.warnings.get(), 0);
        assert!(output.notice.expect("notice").starts_with("Not found:"));
    }

    #[test]
    fn loads_todos_tasks_and_joins_metadata() {
        let dir = tempdir().expect("tempdir");
        let paths = board_paths(dir.path());

        write(
            paths.todos_dir.join("s1-agent-s1.json"),
            r#"[{"content": "Plan", "status": "completed"}, {"content": "Build", "status": "pending"}]"#,
        );
        write(paths.todos_dir.join("empty-agent-empty.json"), "[]");
        write(paths.todos_dir.join("broken-agent-broken.json"), "{not json");
        write(paths.todos_dir.join("notes.txt"), "ignored");

        write(
            paths.tasks_dir.join("s2").join("10.json"),
            r#"{"id": "10", "subject": "Later", "status": "pending"}"#,
        );
        write(
            paths.tasks_dir.join("s2").join("2.json"),
            r#"{"id": "2", "subject": "First", "status": "in_progress", "owner": "lead"}"#,
        );
        write(paths.tasks_dir.join("s2").join(".lock"), "");
        fs::create_dir_all(paths.tasks_dir.join("idle")).expect("mkdir");

        write(
            paths.projects_dir.join("-home-me-app").join("sessions-index.json"),
            r#"{"entries": [{"sessionId": "s1", "projectPath": "/home/me/app", "gitBranch": "dev"}]}"#,
        );

        let output = load_sessions(&paths);
        assert_eq!(output.warnings.get(), 1);
        assert_eq!(output.notice, None);
        assert_eq!(output.sessions.len(), 2);

        let todos = output
            .sessions
            .iter()
            .find(|s| s.source == SessionSource::Todos)
            .expect("todos session");
        assert_eq!(todos.id, "s1");
        assert_eq!(todos.items.len(), 2);
        let meta = todos.meta.as_ref().expect("meta");
        assert_eq!(meta.project.as_deref(), Some("app"));
        assert_eq!(meta.git_branch.as_deref(), Some("dev"));

        let tasks = output
            .sessions
            .iter()
            .find(|s| s.source == SessionSource::Tasks)
            .expect("tasks session");
        assert_eq!(tasks.id, "s2");
        assert!(tasks.meta.is_none());
        let ids = tasks
            .items
            .iter()
            .map(|item| match item {
                SessionItem::Task(task) => task.id.clone(),
                SessionItem::Todo(_) => String::new(),
            })
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["2".to_string(), "10".to_string()]);
        assert_eq!(*tasks.items[0].status(), ItemStatus::InProgress);
    }

    fn write_at(path: PathBuf, text: &str, secs: u64) {
        write(path.clone(), text);
        let file = File::options().write(true).open(&path).expect("open");
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .expect("set mtime");
    }

    #[test]
    fn newest_file_wins_and_sessions_sort_newest_first() {
        let dir = tempdir().expect("tempdir");
        let paths = board_paths(dir.path());

        write_at(
            paths.todos_dir.join("s1-agent-a.json"),
            r#"[{"content": "old", "status": "pending"}]"#,
            1_000,
        );
        write_at(
            paths.todos_dir.join("s1-agent-b.json"),
            r#"[{"content": "new", "status": "pending"}]"#,
            1_005,
        );
        write_at(paths.todos_dir.join("s1-agent-c.json"), "[]", 2_000);

        write_at(
            paths.tasks_dir.join("t1").join("1.json"),
            r#"{"id": 1, "subject": "a", "status": "completed"}"#,
            900,
        );
        write_at(
            paths.tasks_dir.join("t1").join("2.json"),
            r#"{"id": 2, "subject": "b", "status": "pending"}"#,
            1_010,
        );

        write_at(
            paths.todos_dir.join("tie.json"),
            r#"[{"content": "x", "status": "pending"}]"#,
            500,
        );
        write_at(
            paths.tasks_dir.join("tie").join("1.json"),
            r#"{"id": 1, "subject": "y", "status": "pending"}"#,
            500,
        );

        let output = load_sessions(&paths);
        let keys = output.sessions.iter().map(SessionData::key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["tasks-t1", "todos-s1", "tasks-tie", "todos-tie"]);

        let tasks = &output.sessions[0];
        assert_eq!(tasks.modified, SystemTime::UNIX_EPOCH + Duration::from_secs(1_010));

        let todos = &output.sessions[1];
        assert_eq!(todos.modified, SystemTime::UNIX_EPOCH + Duration::from_secs(1_005));
        assert_eq!(todos.items.len(), 1);
        match &todos.items[0] {
            SessionItem::Todo(todo) => assert_eq!(todo.content, "new"),
            SessionItem::Task(_) => panic!("expected a todo item"),
        }
    }

    #[test]
    fn task_ids_sort_numeric_before_text() {
        let task = |id: &str| TaskItem {
            id: id.to_string(),
            subject: String::new(),
            status: ItemStatus::Pending,
            owner: None,
        };
        let mut tasks = vec![task("b"), task("11"), task("a"), task("3")];
        tasks.sort_by(compare_task_ids);
        let ids = tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["3", "11", "a", "b"]);
    }
}
