use crate::domain::{ProgressBar, SessionData, SessionItem, item_label, session_title};
use crate::infra::{BoardPaths, PathOverrides, load_sessions};
use crate::ui::status_icon;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui {
        overrides: PathOverrides,
    },
    Command {
        overrides: PathOverrides,
        command: CliCommand,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    List {
        json: bool,
        items: bool,
        limit: Option<usize>,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut overrides = PathOverrides::default();
    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.peek() {
        if arg.as_str() == "--" {
            let _ = iter.next();
            break;
        }
        if !is_path_flag(arg) {
            break;
        }
        let Some(flag) = iter.next() else {
            break;
        };
        let value = iter
            .next()
            .ok_or_else(|| CliParseError::MissingFlagValue(flag.to_string()))?;
        apply_path_flag(&mut overrides, flag, value)?;
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Tui { overrides });
    };

    match subcommand.as_str() {
        "list" | "ls" => {
            let mut json = false;
            let mut items = false;
            let mut limit: Option<usize> = None;

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--json" => json = true,
                    "--items" => items = true,
                    "--limit" => {
                        let value = iter.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--limit".to_string())
                        })?;
                        limit = Some(parse_usize_flag("--limit", value)?);
                    }
                    flag if is_path_flag(flag) => {
                        let value = iter
                            .next()
                            .ok_or_else(|| CliParseError::MissingFlagValue(flag.to_string()))?;
                        apply_path_flag(&mut overrides, flag, value)?;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }

            Ok(CliInvocation::Command {
                overrides,
                command: CliCommand::List { json, items, limit },
            })
        }
        other if other.starts_with('-') => Err(CliParseError::UnknownFlag(other.to_string())),
        other => Err(CliParseError::UnknownSubcommand(other.to_string())),
    }
}

fn is_path_flag(arg: &str) -> bool {
    matches!(arg, "--todos-dir" | "--tasks-dir" | "--projects-dir")
}

fn apply_path_flag(
    overrides: &mut PathOverrides,
    flag: &str,
    value: &str,
) -> Result<(), CliParseError> {
    if value.trim().is_empty() {
        return Err(CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        });
    }
    let path = Some(PathBuf::from(value));
    match flag {
        "--todos-dir" => overrides.todos_dir = path,
        "--tasks-dir" => overrides.tasks_dir = path,
        "--projects-dir" => overrides.projects_dir = path,
        other => return Err(CliParseError::UnknownFlag(other.to_string())),
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    WriteOutput(#[from] io::Error),
}

pub fn run(command: CliCommand, paths: &BoardPaths) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut err = io::BufWriter::new(stderr.lock());

    match command {
        CliCommand::List { json, items, limit } => {
            let output = load_sessions(paths);
            let sessions = match limit {
                Some(limit) => &output.sessions[..limit.min(output.sessions.len())],
                None => &output.sessions[..],
            };

            if json {
                let payload = serde_json::Value::Array(sessions.iter().map(session_json).collect());
                let text = serde_json::to_string_pretty(&payload)
                    .unwrap_or_else(|_| payload.to_string());
                let _ = write_line(&mut out, &text)?;
            } else {
                write_sessions_tsv(&mut out, sessions, items)?;
            }

            out.flush()?;
            write_load_notice(&mut err, output.notice, output.warnings.get())?;
            err.flush()?;
        }
    }

    Ok(())
}

fn write_sessions_tsv(
    out: &mut impl Write,
    sessions: &[SessionData],
    items: bool,
) -> Result<(), CliRunError> {
    for session in sessions {
        let bar = ProgressBar::for_session(session);
        let line = format!(
            "{}\t{}\t{}\t{}\t{}",
            session.source.key_prefix(),
            session.id,
            session_title(session),
            bar.fraction(),
            format_rfc3339(session.modified)
        );
        if !write_line(out, &line)? {
            return Ok(());
        }

        if !items {
            continue;
        }
        for item in &session.items {
            let line = format!("  {} {}", status_icon(item.status()), item_label(item));
            if !write_line(out, &line)? {
                return Ok(());
            }
        }
    }
    Ok(())
}

fn session_json(session: &SessionData) -> serde_json::Value {
    let bar = ProgressBar::for_session(session);
    let meta = session.meta.clone().unwrap_or_default();
    let items = session
        .items
        .iter()
        .map(|item| {
            let (kind, id, owner) = match item {
                SessionItem::Todo(_) => ("todo", None, None),
                SessionItem::Task(task) => ("task", Some(task.id.clone()), task.owner.clone()),
            };
            serde_json::json!({
                "kind": kind,
                "id": id,
                "label": item_label(item),
                "status": item.status().as_str(),
                "owner": owner,
            })
        })
        .collect::<Vec<_>>();

    serde_json::json!({
        "key": session.key(),
        "source": session.source.key_prefix(),
        "session_id": session.id.clone(),
        "title": session_title(session),
        "done": bar.done,
        "total": bar.total,
        "modified": format_rfc3339(session.modified),
        "project": meta.project,
        "git_branch": meta.git_branch,
        "summary": meta.summary,
        "first_prompt": meta.first_prompt,
        "items": items,
    })
}

fn format_rfc3339(time: std::time::SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "-".to_string())
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}

fn parse_usize_flag(flag: &str, value: &str) -> Result<usize, CliParseError> {
    value
        .parse::<usize>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

fn write_load_notice(
    err: &mut impl Write,
    notice: Option<String>,
    warnings: usize,
) -> Result<(), CliRunError> {
    if let Some(notice) = notice {
        let _ = write_line(err, &notice)?;
    }
    if warnings > 0 {
        let _ = write_line(err, &format!("warnings: {warnings}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemStatus, SessionMeta, SessionSource, TaskItem, TodoItem};
    use std::time::{Duration, SystemTime};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn parse_defaults_to_tui_when_no_args() {
        let parsed = parse_invocation(&args(&["ccdash"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Tui {
                overrides: PathOverrides::default()
            }
        );
    }

    #[test]
    fn parse_help_flag_wins() {
        let parsed = parse_invocation(&args(&["ccdash", "list", "--help"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintHelp);
    }

    #[test]
    fn parse_dir_flags_before_subcommand_apply_to_tui() {
        let parsed = parse_invocation(&args(&[
            "ccdash",
            "--todos-dir",
            "/tmp/t",
            "--tasks-dir",
            "/tmp/k",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Tui {
                overrides: PathOverrides {
                    todos_dir: Some(PathBuf::from("/tmp/t")),
                    tasks_dir: Some(PathBuf::from("/tmp/k")),
                    projects_dir: None,
                }
            }
        );
    }

    #[test]
    fn parse_list_with_flags() {
        let parsed = parse_invocation(&args(&[
            "ccdash",
            "list",
            "--json",
            "--limit",
            "3",
            "--projects-dir",
            "/tmp/p",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command {
                overrides: PathOverrides {
                    projects_dir: Some(PathBuf::from("/tmp/p")),
                    ..PathOverrides::default()
                },
                command: CliCommand::List {
                    json: true,
                    items: false,
                    limit: Some(3),
                },
            }
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            parse_invocation(&args(&["ccdash", "watch"])),
            Err(CliParseError::UnknownSubcommand(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccdash", "list", "--limit", "many"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccdash", "--todos-dir"])),
            Err(CliParseError::MissingFlagValue(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccdash", "--bogus"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccdash", "list", "extra"])),
            Err(CliParseError::UnexpectedArgument(_))
        ));
    }

    fn sample_session() -> SessionData {
        SessionData {
            id: "0123456789".to_string(),
            source: SessionSource::Tasks,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(86_400),
            items: vec![
                SessionItem::Task(TaskItem {
                    id: "1".to_string(),
                    subject: "Parse files".to_string(),
                    status: ItemStatus::Completed,
                    owner: None,
                }),
                SessionItem::Todo(TodoItem {
                    content: "Render".to_string(),
                    status: ItemStatus::Pending,
                }),
            ],
            meta: Some(SessionMeta {
                project: Some("ccdash".to_string()),
                ..SessionMeta::default()
            }),
        }
    }

    #[test]
    fn tsv_lists_sessions_with_optional_items() {
        let sessions = vec![sample_session()];
        let mut out = Vec::new();
        write_sessions_tsv(&mut out, &sessions, true).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(
            lines[0],
            "tasks\t0123456789\tccdash\t1/2\t1970-01-02T00:00:00Z"
        );
        assert_eq!(lines[1], "  ✔ #1 Parse files");
        assert_eq!(lines[2], "  ○ Render");
    }

    #[test]
    fn json_payload_carries_key_and_items() {
        let value = session_json(&sample_session());
        assert_eq!(value["key"], "tasks-0123456789");
        assert_eq!(value["done"], 1);
        assert_eq!(value["total"], 2);
        assert_eq!(value["items"][0]["kind"], "task");
        assert_eq!(value["items"][0]["label"], "#1 Parse files");
        assert_eq!(value["items"][1]["status"], "pending");
        assert!(value["git_branch"].is_null());
    }
}
