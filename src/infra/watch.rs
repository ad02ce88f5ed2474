use notify::event::EventKind;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};
use thiserror::Error;

#[derive(Clone, Debug)]
pub enum WatchSignal {
    Changed,
    Error(String),
}

#[derive(Debug)]
pub struct BoardDirWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<WatchSignal>,
}

impl BoardDirWatcher {
    pub fn try_recv(&self) -> Option<WatchSignal> {
        self.rx.try_recv().ok()
    }
}

#[derive(Debug, Error)]
pub enum WatchBoardDirError {
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn watch_board_dir(path: &Path) -> Result<BoardDirWatcher, WatchBoardDirError> {
    let (tx, rx) = channel::<WatchSignal>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                if should_trigger_reload(&event) {
                    let _ = tx.send(WatchSignal::Changed);
                }
            }
            Err(error) => {
                let _ = tx.send(WatchSignal::Error(error.to_string()));
            }
        },
        Config::default(),
    )?;

    watcher.watch(path, RecursiveMode::Recursive)?;

    Ok(BoardDirWatcher {
        _watcher: watcher,
        rx,
    })
}

/// Watchers for a fixed set of directories. A directory missing at startup is
/// attached by a later `attach_missing` call once it exists.
#[derive(Debug)]
pub struct BoardWatchers {
    slots: Vec<(PathBuf, Option<BoardDirWatcher>)>,
}

impl BoardWatchers {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            slots: dirs.into_iter().map(|dir| (dir, None)).collect(),
        }
    }

    /// Starts watchers for unwatched directories that now exist.
    pub fn attach_missing(&mut self) -> Vec<(PathBuf, WatchBoardDirError)> {
        let mut failures = Vec::new();
        for (dir, slot) in &mut self.slots {
            if slot.is_some() || !dir.is_dir() {
                continue;
            }
            match watch_board_dir(dir) {
                Ok(watcher) => *slot = Some(watcher),
                Err(error) => failures.push((dir.clone(), error)),
            }
        }
        failures
    }

    pub fn watched_count(&self) -> usize {
        self.slots.iter().filter(|(_, slot)| slot.is_some()).count()
    }

    pub fn drain(&self) -> Vec<WatchSignal> {
        let mut signals = Vec::new();
        for watcher in self.slots.iter().filter_map(|(_, slot)| slot.as_ref()) {
            while let Some(signal) = watcher.try_recv() {
                signals.push(signal);
            }
        }
        signals
    }
}

fn should_trigger_reload(event: &notify::Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    if event.paths.is_empty() {
        return true;
    }
    // Removing a whole tasks/<session> directory reports the directory path only.
    if matches!(event.kind, EventKind::Remove(_)) {
        return true;
    }

    event
        .paths
        .iter()
        .any(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
}
