//! Config file watcher.
//!
//! Uses the notify crate to watch the config file so saved queries and
//! explorer settings are re-read when the user edits them.

use super::{load_from_path, Config};
use anyhow::Result;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Duration;

/// Watches one config file and reloads it on change.
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        // Watch the parent directory: editors often replace the file on save
        let dir = path.parent().unwrap_or(Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            path: path.to_path_buf(),
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Drain pending events and reload once if any touched the config file.
    ///
    /// Returns `None` when nothing changed or the new file fails to parse
    /// (the previous config stays in effect).
    pub fn poll(&self) -> Option<Config> {
        let mut changed = false;

        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => {
                    if self.concerns_config(&event) {
                        changed = true;
                    }
                }
                Ok(Err(e)) => {
                    tracing::debug!("Config watcher error: {}", e);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if !changed {
            return None;
        }

        match load_from_path(&self.path) {
            Ok(config) => {
                tracing::info!("Reloaded config from {}", self.path.display());
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Ignoring config change: {:#}", e);
                None
            }
        }
    }

    fn concerns_config(&self, event: &Event) -> bool {
        let name = self.path.file_name();
        event
            .paths
            .iter()
            .any(|p| p == &self.path || (name.is_some() && p.file_name() == name))
    }
}
