use std::time::SystemTime;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SessionSource {
    Todos,
    Tasks,
}

impl SessionSource {
    pub fn key_prefix(self) -> &'static str {
        match self {
            Self::Todos => "todos",
            Self::Tasks => "tasks",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ItemStatus {
    Pending,
    InProgress,
    Completed,
    /// Anything the writer produced that we do not recognize; kept verbatim.
    Unknown(String),
}

impl ItemStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TodoItem {
    pub content: String,
    pub status: ItemStatus,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskItem {
    pub id: String,
    pub subject: String,
    pub status: ItemStatus,
    pub owner: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionItem {
    Todo(TodoItem),
    Task(TaskItem),
}

impl SessionItem {
    pub fn status(&self) -> &ItemStatus {
        match self {
            Self::Todo(todo) => &todo.status,
            Self::Task(task) => &task.status,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Todo(_) => None,
            Self::Task(task) => task.owner.as_deref().filter(|owner| !owner.is_empty()),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionMeta {
    pub project: Option<String>,
    pub git_branch: Option<String>,
    pub summary: Option<String>,
    pub first_prompt: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionData {
    pub id: String,
    pub source: SessionSource,
    pub modified: SystemTime,
    pub items: Vec<SessionItem>,
    pub meta: Option<SessionMeta>,
}

impl SessionData {
    /// Ids are only unique within one source, so the key carries the source too.
    pub fn key(&self) -> String {
        format!("{}-{}", self.source.key_prefix(), self.id)
    }

    pub fn completed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status().is_completed())
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }
}
