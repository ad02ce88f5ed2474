use dirs::home_dir;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveBoardPathsError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoardPaths {
    pub todos_dir: PathBuf,
    pub tasks_dir: PathBuf,
    pub projects_dir: PathBuf,
}

/// Explicit directories from the command line; they beat env overrides.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathOverrides {
    pub todos_dir: Option<PathBuf>,
    pub tasks_dir: Option<PathBuf>,
    pub projects_dir: Option<PathBuf>,
}

pub fn resolve_board_paths(
    overrides: &PathOverrides,
) -> Result<BoardPaths, ResolveBoardPathsError> {
    Ok(BoardPaths {
        todos_dir: resolve_dir(overrides.todos_dir.as_ref(), "CLAUDE_TODOS_DIR", "todos")?,
        tasks_dir: resolve_dir(overrides.tasks_dir.as_ref(), "CLAUDE_TASKS_DIR", "tasks")?,
        projects_dir: resolve_dir(
            overrides.projects_dir.as_ref(),
            "CLAUDE_PROJECTS_DIR",
            "projects",
        )?,
    })
}

fn resolve_dir(
    flag: Option<&PathBuf>,
    env_var: &str,
    leaf: &str,
) -> Result<PathBuf, ResolveBoardPathsError> {
    if let Some(path) = flag {
        return Ok(path.clone());
    }

    if let Some(override_dir) = std::env::var_os(env_var) {
        if !override_dir.is_empty() {
            return Ok(PathBuf::from(override_dir));
        }
    }

    let Some(home) = home_dir() else {
        return Err(ResolveBoardPathsError::HomeDirNotFound);
    };

    Ok(home.join(".claude").join(leaf))
}

/// Human label for a watched directory: home collapsed to `~`, trailing slash.
pub fn display_path(path: &Path) -> String {
    display_path_with_home(path, home_dir().as_deref())
}

fn display_path_with_home(path: &Path, home: Option<&Path>) -> String {
    let shown = match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    };

    if shown.ends_with('/') {
        shown
    } else {
        format!("{shown}/")
    }
}
