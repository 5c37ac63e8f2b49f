//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Quiet period before a burst of events is forwarded.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// A path to watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub recursive: bool,
}

impl WatchTarget {
    /// Watch a directory and everything below it.
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
        }
    }

    /// Watch a single file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
        }
    }
}

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Markdown source was created or modified
    Markdown(PathBuf),

    /// Build configuration was modified
    Config(PathBuf),

    /// Any other file was created or modified
    Asset(PathBuf),

    /// File was deleted
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            Self::Markdown(p) | Self::Config(p) | Self::Asset(p) | Self::Removed(p) => p,
        }
    }
}

/// File watcher for detecting source changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `targets`, dropping events below any of the `ignore` prefixes.
    ///
    /// Targets that do not exist are skipped. Returns the watcher and a
    /// channel to receive events; the watcher must be kept alive.
    pub fn new(
        targets: &[WatchTarget],
        ignore: &[PathBuf],
        config_file: Option<&Path>,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for target in targets {
            if !target.path.exists() {
                tracing::debug!("Not watching missing path: {}", target.path.display());
                continue;
            }

            let mode = if target.recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher
                .watch(&absolute(&target.path), mode)
                .map_err(std::io::Error::other)?;
            tracing::info!("Watching {}", target.path.display());
        }

        let ignore: Vec<PathBuf> = ignore.iter().map(|p| absolute(p)).collect();
        let config_file = config_file.map(absolute);

        // Forward events in debounced batches
        std::thread::spawn(move || {
            while let Ok(first) = sync_rx.recv() {
                let mut batch = vec![first];
                while let Ok(event) = sync_rx.recv_timeout(DEBOUNCE) {
                    batch.push(event);
                }

                for event in batch {
                    for path in &event.paths {
                        if ignore.iter().any(|prefix| path.starts_with(prefix)) {
                            continue;
                        }
                        if let Some(e) = classify_event(path, &event.kind, config_file.as_deref())
                        {
                            if async_tx.blocking_send(e).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Best-effort absolute form of `path` for prefix comparisons.
fn absolute(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Classify a notify event into a WatchEvent.
fn classify_event(
    path: &Path,
    kind: &notify::EventKind,
    config_file: Option<&Path>,
) -> Option<WatchEvent> {
    use notify::EventKind;

    match kind {
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        EventKind::Create(_) | EventKind::Modify(_) => {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

            if config_file.is_some_and(|config| path == config || path.ends_with(config)) {
                Some(WatchEvent::Config(path.to_path_buf()))
            } else if ext == "md" || ext == "markdown" {
                Some(WatchEvent::Markdown(path.to_path_buf()))
            } else {
                Some(WatchEvent::Asset(path.to_path_buf()))
            }
        }
        _ => None,
    }
}
