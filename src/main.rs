mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppEvent, AppModel, BoardData, ReloadSchedule};
use crate::cli::CliInvocation;
use crate::infra::{
    BoardPaths, BoardWatchers, PathOverrides, WatchSignal, load_sessions, resolve_board_paths,
};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout, Write};
use std::sync::Mutex;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const RELOAD_DEBOUNCE: Duration = Duration::from_millis(300);
const RELOAD_MAX_DELAY: Duration = Duration::from_secs(2);
const EVENT_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

#[derive(Debug)]
enum BoardReloadSignal {
    Loaded {
        generation: u64,
        data: BoardData,
        notice: Option<String>,
    },
}

fn main() {
    init_logging();
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { overrides } => Ok(run_tui(&overrides)?),
        CliInvocation::Command { overrides, command } => {
            let paths = resolve_board_paths(&overrides).map_err(app::AppError::from)?;
            crate::cli::run(command, &paths)?;
            Ok(())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_file = std::env::var_os("CCDASH_LOG")
        .filter(|value| !value.is_empty())
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} - live dashboard of Claude todo lists and task boards\n\nUSAGE:\n  {name} [DIR FLAGS]                      Start the dashboard\n  {name} [DIR FLAGS] list [--json] [--items] [--limit N]  Print sessions once\n  {name} --help | --version\n\nDIR FLAGS:\n  --todos-dir PATH     Todo lists directory (default: ~/.claude/todos)\n  --tasks-dir PATH     Task boards directory (default: ~/.claude/tasks)\n  --projects-dir PATH  Session indexes directory (default: ~/.claude/projects)\n\nLIST FLAGS:\n  --json       Output structured JSON (includes items)\n  --items      Print each item under its session\n  --limit N    Max sessions to print\n\nKEYS:\n  q/Esc/Ctrl+C quit   r/Ctrl+R rescan   j/k/arrows scroll   PgUp/PgDn page   g/G top/bottom\n\nOUTPUT:\n  list: source<TAB>session_id<TAB>title<TAB>done/total<TAB>modified_rfc3339\n\nENV:\n  CLAUDE_TODOS_DIR     Override todos dir\n  CLAUDE_TASKS_DIR     Override tasks dir\n  CLAUDE_PROJECTS_DIR  Override projects dir\n  CCDASH_LOG           Append logs to this file (filter with RUST_LOG, default: info)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn load_board(paths: &BoardPaths) -> (BoardData, Option<String>) {
    let output = load_sessions(paths);
    info!(
        sessions = output.sessions.len(),
        warnings = output.warnings.get(),
        "loaded board"
    );
    (
        BoardData::from_load(paths.clone(), output.sessions, output.warnings),
        output.notice,
    )
}

fn run_tui(overrides: &PathOverrides) -> Result<(), crate::app::AppError> {
    let paths = resolve_board_paths(overrides)?;
    info!(
        todos = %paths.todos_dir.display(),
        tasks = %paths.tasks_dir.display(),
        projects = %paths.projects_dir.display(),
        "starting dashboard"
    );
    let (data, notice) = load_board(&paths);
    let mut model = AppModel::new(data).with_notice(notice);
    let mut terminal = setup_terminal()?;
    if let Ok((width, height)) = terminal_size() {
        model = model.with_terminal_size(width, height);
    }
    let result = run(&mut terminal, &mut model);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn attach_watchers(watchers: &mut BoardWatchers, model: &mut AppModel) {
    for (dir, error) in watchers.attach_missing() {
        warn!(path = %dir.display(), %error, "watcher disabled");
        *model = model.with_notice(Some(format!(
            "Auto-refresh disabled: {error} (r to rescan)"
        )));
    }
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
) -> Result<(), app::AppError> {
    let paths = model.data.paths.clone();
    let mut watchers = BoardWatchers::new([
        paths.todos_dir.clone(),
        paths.tasks_dir.clone(),
        paths.projects_dir.clone(),
    ]);
    attach_watchers(&mut watchers, model);
    info!(watched = watchers.watched_count(), "watching board directories");

    let (reload_tx, reload_rx) = channel::<BoardReloadSignal>();
    let mut schedule = ReloadSchedule::new(RELOAD_DEBOUNCE, RELOAD_MAX_DELAY);

    loop {
        while let Ok(signal) = reload_rx.try_recv() {
            match signal {
                BoardReloadSignal::Loaded {
                    generation,
                    data,
                    notice,
                } => {
                    if schedule.finish(generation) {
                        *model = model.with_data(data).with_notice(notice);
                    } else {
                        info!(generation, "dropped reload superseded by rescan");
                    }
                }
            }
        }

        for signal in watchers.drain() {
            match signal {
                WatchSignal::Changed => schedule.note_change(Instant::now()),
                WatchSignal::Error(message) => {
                    warn!(%message, "watcher error");
                    *model = model.with_notice(Some(format!("Watcher error: {message}")));
                }
            }
        }

        if let Some(generation) = schedule.start_due(Instant::now()) {
            let paths = model.data.paths.clone();
            let tx = reload_tx.clone();
            std::thread::spawn(move || {
                let (data, notice) = load_board(&paths);
                let _ = tx.send(BoardReloadSignal::Loaded {
                    generation,
                    data,
                    notice,
                });
            });
        }

        terminal.draw(|frame| ui::render(frame, model, SystemTime::now()))?;

        if event::poll(EVENT_POLL)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    let (next, command) = app::update(model.clone(), AppEvent::Key(key));
                    *model = next;
                    match command {
                        AppCommand::None => {}
                        AppCommand::Quit => return Ok(()),
                        AppCommand::Rescan => {
                            schedule.rescan();
                            attach_watchers(&mut watchers, model);
                            let (data, notice) = load_board(&model.data.paths);
                            let notice = notice.or_else(|| Some("Rescanned.".to_string()));
                            *model = model.with_data(data).with_notice(notice);
                        }
                    }
                }
                Event::Resize(width, height) => {
                    let (next, _) = app::update(model.clone(), AppEvent::Resize(width, height));
                    *model = next;
                }
                _ => {}
            }
        }
    }
}
