use crate::domain::{ItemStatus, SessionMeta, TaskItem, TodoItem};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct TodoRecord {
    content: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskIdRecord {
    Number(u64),
    Text(String),
}

impl TaskIdRecord {
    fn into_string(self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskRecord {
    id: TaskIdRecord,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    owner: Option<String>,
}

/// A todo file is a JSON array written whole on every update.
pub fn parse_todo_file(text: &str) -> Result<Vec<TodoItem>, ParseError> {
    let records: Vec<TodoRecord> = serde_json::from_str(text)?;
    Ok(records
        .into_iter()
        .map(|record| TodoItem {
            content: record.content,
            status: ItemStatus::parse(&record.status),
        })
        .collect())
}

pub fn parse_task_file(text: &str) -> Result<TaskItem, ParseError> {
    let record: TaskRecord = serde_json::from_str(text)?;
    Ok(TaskItem {
        id: record.id.into_string(),
        subject: record.subject,
        status: ItemStatus::parse(&record.status),
        owner: non_empty(record.owner),
    })
}

#[derive(Debug, Deserialize)]
struct SessionsIndexRecord {
    #[serde(rename = "originalPath", default)]
    original_path: Option<String>,

    #[serde(default)]
    entries: Vec<SessionsIndexEntryRecord>,
}

#[derive(Debug, Deserialize)]
struct SessionsIndexEntryRecord {
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,

    #[serde(rename = "projectPath", default)]
    project_path: Option<String>,

    #[serde(rename = "gitBranch", default)]
    git_branch: Option<String>,

    #[serde(default)]
    summary: Option<String>,

    #[serde(rename = "firstPrompt", default)]
    first_prompt: Option<String>,
}

/// Returns `(session_id, meta)` pairs; entries without a session id are dropped.
pub fn parse_sessions_index(text: &str) -> Result<Vec<(String, SessionMeta)>, ParseError> {
    let index: SessionsIndexRecord = serde_json::from_str(text)?;
    let fallback_project = index.original_path;

    Ok(index
        .entries
        .into_iter()
        .filter_map(|entry| {
            let session_id = non_empty(entry.session_id)?;
            let project_path = non_empty(entry.project_path).or_else(|| fallback_project.clone());
            let meta = SessionMeta {
                project: project_path.as_deref().and_then(project_name_from_path),
                git_branch: non_empty(entry.git_branch),
                summary: non_empty(entry.summary),
                first_prompt: non_empty(entry.first_prompt),
            };
            Some((session_id, meta))
        })
        .collect())
}

pub fn project_name_from_path(path: &str) -> Option<String> {
    Path::new(path.trim_end_matches('/'))
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
}

/// Todo files are named `<session>-agent-<agent>.json`.
pub fn todo_session_id(file_stem: &str) -> &str {
    match file_stem.find("-agent-") {
        Some(pos) if pos > 0 => &file_stem[..pos],
        _ => file_stem,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
