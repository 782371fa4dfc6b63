// SPDX-License-Identifier: MIT OR Apache-2.0
//! File system watcher for the open alert document.
//!
//! The document's directory is watched rather than the file itself, since
//! most editors save by writing a new file and renaming it over the old one.
//! Events are debounced and filtered down to the document path.

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, EventKind, RecommendedWatcher, RecursiveMode},
    DebounceEventResult, Debouncer, RecommendedCache,
};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// Default debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Events emitted by the watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// The document was written or replaced
    Modified(PathBuf),
    /// The document was deleted
    Removed(PathBuf),
    /// The watcher reported an error
    Error(String),
}

/// Watches a single document for external changes
pub struct DocumentWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    event_rx: Receiver<FileEvent>,
    /// Document being watched, shared with the debouncer callback
    document: Arc<RwLock<Option<PathBuf>>>,
    watched_dir: Option<PathBuf>,
}

impl DocumentWatcher {
    /// Create a watcher with the given debounce window
    pub fn new(debounce: Duration) -> Result<Self, notify::Error> {
        let (event_tx, event_rx) = mpsc::channel();
        let document: Arc<RwLock<Option<PathBuf>>> = Arc::new(RwLock::new(None));
        let filter = document.clone();

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            let errors = match result {
                Ok(events) => {
                    let Some(target) = filter.read().clone() else {
                        return;
                    };
                    for event in events {
                        if !event.paths.iter().any(|p| p == &target) {
                            continue;
                        }
                        let file_event = match event.kind {
                            EventKind::Create(_) | EventKind::Modify(_) => FileEvent::Modified(target.clone()),
                            EventKind::Remove(_) => FileEvent::Removed(target.clone()),
                            EventKind::Any | EventKind::Access(_) | EventKind::Other => continue,
                        };
                        let _ = event_tx.send(file_event);
                    }
                    return;
                }
                Err(errors) => errors,
            };
            for error in errors {
                let _ = event_tx.send(FileEvent::Error(error.to_string()));
            }
        })?;

        Ok(Self {
            debouncer,
            event_rx,
            document,
            watched_dir: None,
        })
    }

    /// Watch `path`, replacing any previous document
    pub fn watch(&mut self, path: &Path) -> Result<(), notify::Error> {
        self.unwatch();

        let file_name = path
            .file_name()
            .ok_or_else(|| notify::Error::generic("document path has no file name"))?;
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        let dir = std::fs::canonicalize(&dir).unwrap_or(dir);

        self.debouncer.watch(&dir, RecursiveMode::NonRecursive)?;
        *self.document.write() = Some(dir.join(file_name));
        tracing::info!("Watching {:?} for changes", path);
        self.watched_dir = Some(dir);
        Ok(())
    }

    /// Stop watching
    pub fn unwatch(&mut self) {
        *self.document.write() = None;
        if let Some(dir) = self.watched_dir.take() {
            if let Err(e) = self.debouncer.unwatch(&dir) {
                tracing::debug!("Failed to unwatch {:?}: {}", dir, e);
            }
        }
    }

    /// Document currently watched, resolved against its canonical directory
    #[cfg(test)]
    pub fn watched_document(&self) -> Option<PathBuf> {
        self.document.read().clone()
    }

    /// Poll for pending events (non-blocking)
    pub fn poll_events(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("File watcher channel disconnected");
                    break;
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn wait_for_events(watcher: &DocumentWatcher) -> Vec<FileEvent> {
        for _ in 0..100 {
            let events = watcher.poll_events();
            if !events.is_empty() {
                return events;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        Vec::new()
    }

    #[test]
    fn test_watch_resolves_document_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("follow.alert.ron");
        std::fs::write(&path, "()").unwrap();

        let mut watcher = DocumentWatcher::new(Duration::from_millis(50)).unwrap();
        watcher.watch(&path).unwrap();
        let watched = watcher.watched_document().unwrap();
        assert!(watched.ends_with("follow.alert.ron"));

        watcher.unwatch();
        assert!(watcher.watched_document().is_none());
    }

    #[test]
    fn test_reports_modification_of_document_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("follow.alert.ron");
        std::fs::write(&path, "()").unwrap();

        let mut watcher = DocumentWatcher::new(Duration::from_millis(50)).unwrap();
        watcher.watch(&path).unwrap();

        std::fs::write(dir.path().join("other.txt"), "ignored").unwrap();
        std::fs::write(&path, "(name: \"changed\")").unwrap();

        let events = wait_for_events(&watcher);
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| matches!(e, FileEvent::Modified(p) if p.ends_with("follow.alert.ron"))));
    }
}
