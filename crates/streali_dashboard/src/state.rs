// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dashboard document state: the alert being edited, its selection,
//! undo history and file binding.

use crate::history::{ElementState, History, HistoryError};
use std::path::{Path, PathBuf};
use streali_alert::{Alert, AlertEdit, AlertElement, AlertError, ElementId, ElementType, Pixels};
use thiserror::Error;

/// File extension used for alert documents
pub const DOCUMENT_EXTENSION: &str = "alert.ron";

/// Offset applied to duplicated elements so the copy is visible
const DUPLICATE_OFFSET: f32 = 20.0;

/// Errors from document load/save
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Save requested before the document has a path
    #[error("No document path set")]
    NoPath,
    /// Filesystem error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
    /// RON encode/decode error
    #[error(transparent)]
    Format(#[from] AlertError),
}

/// Document state shared by all panels
pub struct DashboardState {
    /// The alert being edited
    pub alert: Alert,
    /// Selected element
    pub selected: Option<ElementId>,
    /// Undo/redo history
    pub history: History,
    document_path: Option<PathBuf>,
    dirty: bool,
    /// State of the element under a live canvas gesture, before it started
    gesture: Option<ElementState>,
}

impl DashboardState {
    /// Create a state holding a fresh, unsaved alert
    pub fn new() -> Self {
        Self {
            alert: Alert::default(),
            selected: None,
            history: History::new(),
            document_path: None,
            dirty: false,
            gesture: None,
        }
    }

    /// Replace the document with an empty alert
    pub fn new_document(&mut self) {
        self.alert = Alert::default();
        self.reset_editing();
        self.document_path = None;
        tracing::info!("Created new alert");
    }

    fn reset_editing(&mut self) {
        self.selected = None;
        self.history.clear();
        self.gesture = None;
        self.dirty = false;
    }

    /// Path the document is bound to
    pub fn document_path(&self) -> Option<&Path> {
        self.document_path.as_deref()
    }

    /// Check if the document has unsaved changes
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Flag a change made outside the edit vocabulary
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Window title with an unsaved marker
    pub fn title(&self) -> String {
        let marker = if self.dirty { "*" } else { "" };
        format!("Streali Dashboard - {}{}", self.alert.name, marker)
    }

    /// Currently selected element, if it still exists
    pub fn selected_element(&self) -> Option<&AlertElement> {
        self.selected.and_then(|id| self.alert.element(id))
    }

    /// Select an element, or clear the selection
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.alert.element(*id).is_some());
    }

    /// Apply an edit and record it for undo
    pub fn apply_edit(&mut self, edit: AlertEdit) -> Result<(), AlertError> {
        let id = edit.target();
        let description = edit.description();
        let inserted = matches!(edit, AlertEdit::Insert(_));

        let before = ElementState::capture(&self.alert, id);
        self.alert.apply(edit)?;
        let after = ElementState::capture(&self.alert, id);

        if before != after {
            self.dirty = true;
        }
        if let Err(e) = self.history.record(description, &before, &after) {
            tracing::error!("Failed to record history for {}: {}", description, e);
        }

        if inserted {
            self.selected = Some(id);
        } else if after.element.is_none() && self.selected == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Start a gesture on `id`; previews are recorded as one operation
    pub fn begin_gesture(&mut self, id: ElementId) {
        if self.gesture.is_some() {
            self.end_gesture("Edit element");
        }
        self.gesture = Some(ElementState::capture(&self.alert, id));
    }

    /// Whether a canvas gesture is in progress
    pub fn in_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    /// Element the open gesture targets
    pub fn gesture_target(&self) -> Option<ElementId> {
        self.gesture.as_ref().map(|state| state.id)
    }

    /// Apply an edit while a gesture is in progress, without recording it
    pub fn preview_edit(&mut self, edit: AlertEdit) -> Result<(), AlertError> {
        if self.alert.apply(edit)?.is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    /// Finish the gesture and record the net change
    pub fn end_gesture(&mut self, description: &str) {
        let Some(before) = self.gesture.take() else {
            return;
        };
        let after = ElementState::capture(&self.alert, before.id);
        if let Err(e) = self.history.record(description, &before, &after) {
            tracing::error!("Failed to record history for {}: {}", description, e);
        }
    }

    /// Abort the gesture, putting the element back
    pub fn cancel_gesture(&mut self) {
        if let Some(before) = self.gesture.take() {
            before.restore_into(&mut self.alert);
        }
    }

    /// Add a new element of `element_type` centered on the canvas
    pub fn add_element(&mut self, element_type: ElementType) -> Result<ElementId, AlertError> {
        let mut element = AlertElement::new(element_type);
        element.pos_x = Pixels(((self.alert.canvas_width.0 - element.width.0) / 2.0).max(0.0));
        element.pos_y = Pixels(((self.alert.canvas_height.0 - element.height.0) / 2.0).max(0.0));
        let id = element.id;
        self.apply_edit(AlertEdit::Insert(element))?;
        Ok(id)
    }

    /// Delete the selected element
    pub fn delete_selected(&mut self) -> Result<(), AlertError> {
        match self.selected {
            Some(id) => self.apply_edit(AlertEdit::Remove(id)),
            None => Ok(()),
        }
    }

    /// Copy the selected element under a new id
    pub fn duplicate_selected(&mut self) -> Result<Option<ElementId>, AlertError> {
        let Some(source) = self.selected_element() else {
            return Ok(None);
        };
        let mut copy = source.clone();
        copy.id = ElementId::new();
        copy.title = format!("{} copy", source.title);
        copy.pos_x = copy.pos_x + Pixels(DUPLICATE_OFFSET);
        copy.pos_y = copy.pos_y + Pixels(DUPLICATE_OFFSET);
        copy.locked = false;
        let id = copy.id;
        self.apply_edit(AlertEdit::Insert(copy))?;
        Ok(Some(id))
    }

    /// Undo the last operation
    pub fn undo(&mut self) -> Result<String, HistoryError> {
        self.cancel_gesture();
        let description = self.history.undo(&mut self.alert)?;
        self.after_history_step();
        Ok(description)
    }

    /// Redo the last undone operation
    pub fn redo(&mut self) -> Result<String, HistoryError> {
        self.cancel_gesture();
        let description = self.history.redo(&mut self.alert)?;
        self.after_history_step();
        Ok(description)
    }

    fn after_history_step(&mut self) {
        self.dirty = true;
        self.select(self.selected);
    }

    /// Save to the bound path
    pub fn save(&mut self) -> Result<PathBuf, DocumentError> {
        let path = self.document_path.clone().ok_or(DocumentError::NoPath)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to `path` and bind the document to it
    pub fn save_to(&mut self, path: &Path) -> Result<(), DocumentError> {
        let contents = self.alert.to_ron_string()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;

        self.document_path = Some(path.to_path_buf());
        self.dirty = false;
        tracing::info!("Saved alert to {:?}", path);
        Ok(())
    }

    /// Load the document at `path`
    pub fn load(&mut self, path: &Path) -> Result<(), DocumentError> {
        let contents = std::fs::read_to_string(path)?;
        self.alert = Alert::from_ron_str(&contents)?;
        self.reset_editing();
        self.document_path = Some(path.to_path_buf());
        tracing::info!("Loaded alert from {:?}", path);
        Ok(())
    }

    /// Re-read the bound file after an external change.
    ///
    /// Returns `Ok(false)` without touching anything when there are unsaved
    /// edits, a gesture is running, or the file matches the document.
    pub fn reload_from_disk(&mut self) -> Result<bool, DocumentError> {
        let Some(path) = self.document_path.clone() else {
            return Ok(false);
        };
        if self.dirty || self.in_gesture() {
            tracing::info!("{:?} changed on disk, keeping unsaved edits", path);
            return Ok(false);
        }

        let contents = std::fs::read_to_string(&path)?;
        let alert = Alert::from_ron_str(&contents)?;
        if alert == self.alert {
            return Ok(false);
        }

        let selected = self.selected;
        self.alert = alert;
        self.reset_editing();
        self.select(selected);
        tracing::info!("Reloaded alert from {:?}", path);
        Ok(true)
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `path` looks like an alert document
pub fn is_document_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(&format!(".{DOCUMENT_EXTENSION}")))
}

/// `path` with the document extension appended when it is missing
pub fn with_document_extension(path: PathBuf) -> PathBuf {
    if is_document_path(&path) {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(format!(".{DOCUMENT_EXTENSION}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use streali_alert::Milliseconds;
    use tempfile::TempDir;

    #[test]
    fn test_apply_edit_marks_dirty_and_records() {
        let mut state = DashboardState::new();
        let id = state.add_element(ElementType::Image).unwrap();
        assert!(state.has_unsaved_changes());
        assert_eq!(state.selected, Some(id));
        assert!(state.title().ends_with('*'));

        state
            .apply_edit(AlertEdit::SetStartTime { id, ms: Milliseconds(500.0) })
            .unwrap();
        assert_eq!(state.history.undo_description(), Some("Change start time"));
    }

    #[test]
    fn test_gesture_records_one_operation() {
        let mut state = DashboardState::new();
        let id = state.add_element(ElementType::Image).unwrap();
        state.history.clear();

        state.begin_gesture(id);
        for x in [10.0, 20.0, 30.0] {
            state
                .preview_edit(AlertEdit::Move { id, x: Pixels(x), y: Pixels(x) })
                .unwrap();
        }
        state.end_gesture("Move element");
        assert_eq!(state.history.undo_len(), 1);

        let start = state.alert.element(id).unwrap().pos_x;
        state.undo().unwrap();
        assert_ne!(state.alert.element(id).unwrap().pos_x, start);
    }

    #[test]
    fn test_cancel_gesture_restores_element() {
        let mut state = DashboardState::new();
        let id = state.add_element(ElementType::Video).unwrap();
        let before = state.alert.element(id).unwrap().clone();

        state.begin_gesture(id);
        state
            .preview_edit(AlertEdit::Resize { id, width: Pixels(50.0), height: Pixels(50.0) })
            .unwrap();
        state.cancel_gesture();

        assert_eq!(state.alert.element(id), Some(&before));
        assert!(!state.in_gesture());
    }

    #[test]
    fn test_delete_clears_selection_and_undo_restores() {
        let mut state = DashboardState::new();
        let id = state.add_element(ElementType::Text).unwrap();

        state.delete_selected().unwrap();
        assert_eq!(state.selected, None);
        assert!(state.alert.element(id).is_none());

        state.undo().unwrap();
        assert!(state.alert.element(id).is_some());
    }

    #[test]
    fn test_duplicate_offsets_copy() {
        let mut state = DashboardState::new();
        let id = state.add_element(ElementType::Image).unwrap();
        let copy = state.duplicate_selected().unwrap().unwrap();

        assert_ne!(copy, id);
        let original = state.alert.element(id).unwrap().pos_x;
        assert_eq!(state.alert.element(copy).unwrap().pos_x, original + Pixels(DUPLICATE_OFFSET));
        assert_eq!(state.selected, Some(copy));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("follow.alert.ron");

        let mut state = DashboardState::new();
        state.alert.name = "Follow".to_string();
        state.add_element(ElementType::Text).unwrap();
        assert!(matches!(state.save(), Err(DocumentError::NoPath)));
        state.save_to(&path).unwrap();
        assert!(!state.has_unsaved_changes());

        let mut loaded = DashboardState::new();
        loaded.load(&path).unwrap();
        assert_eq!(loaded.alert, state.alert);
        assert_eq!(loaded.document_path(), Some(path.as_path()));
        assert!(!loaded.history.can_undo());
    }

    #[test]
    fn test_reload_skips_dirty_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raid.alert.ron");

        let mut state = DashboardState::new();
        state.save_to(&path).unwrap();

        let mut other = Alert::default();
        other.name = "Changed elsewhere".to_string();
        std::fs::write(&path, other.to_ron_string().unwrap()).unwrap();

        state.add_element(ElementType::Audio).unwrap();
        assert!(!state.reload_from_disk().unwrap());

        state.save().unwrap();
        std::fs::write(&path, other.to_ron_string().unwrap()).unwrap();
        assert!(state.reload_from_disk().unwrap());
        assert_eq!(state.alert.name, "Changed elsewhere");
        assert!(!state.reload_from_disk().unwrap());
    }

    #[test]
    fn test_document_extension() {
        assert!(is_document_path(Path::new("/tmp/follow.alert.ron")));
        assert!(!is_document_path(Path::new("/tmp/dashboard.ron")));
        assert_eq!(
            with_document_extension(PathBuf::from("alerts/follow")),
            PathBuf::from("alerts/follow.alert.ron")
        );
        assert_eq!(
            with_document_extension(PathBuf::from("follow.alert.ron")),
            PathBuf::from("follow.alert.ron")
        );
    }
}
