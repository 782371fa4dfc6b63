// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document edits.
//!
//! The canvas editor and the timeline never touch each other. Both turn
//! pointer gestures into [`AlertEdit`] values which are applied to the one
//! [`Alert`], and both re-read the document every frame.

use crate::alert::{Alert, AlertError, AlertResult};
use crate::canvas::MIN_ELEMENT_SIZE;
use crate::element::{AlertElement, ElementId};
use crate::units::{Milliseconds, Pixels};
use serde::{Deserialize, Serialize};

/// Shortest duration an element may have
pub const MIN_DURATION: Milliseconds = Milliseconds(100.0);

/// A single change to an alert document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertEdit {
    /// Move an element on the canvas
    Move {
        /// Target element
        id: ElementId,
        /// New left edge
        x: Pixels,
        /// New top edge
        y: Pixels,
    },
    /// Resize an element on the canvas
    Resize {
        /// Target element
        id: ElementId,
        /// New width
        width: Pixels,
        /// New height
        height: Pixels,
    },
    /// Change when an element appears
    SetStartTime {
        /// Target element
        id: ElementId,
        /// New start time
        ms: Milliseconds,
    },
    /// Change how long an element stays
    SetDuration {
        /// Target element
        id: ElementId,
        /// New duration
        ms: Milliseconds,
    },
    /// Overwrite an element wholesale (inspector edits, undo)
    Replace(AlertElement),
    /// Add a new element
    Insert(AlertElement),
    /// Delete an element
    Remove(ElementId),
}

impl AlertEdit {
    /// Element the edit targets
    pub fn target(&self) -> ElementId {
        match self {
            Self::Move { id, .. }
            | Self::Resize { id, .. }
            | Self::SetStartTime { id, .. }
            | Self::SetDuration { id, .. }
            | Self::Remove(id) => *id,
            Self::Replace(element) | Self::Insert(element) => element.id,
        }
    }

    /// Short label for history entries
    pub fn description(&self) -> &'static str {
        match self {
            Self::Move { .. } => "Move element",
            Self::Resize { .. } => "Resize element",
            Self::SetStartTime { .. } => "Change start time",
            Self::SetDuration { .. } => "Change duration",
            Self::Replace(_) => "Edit element",
            Self::Insert(_) => "Add element",
            Self::Remove(_) => "Delete element",
        }
    }

    /// Whether a gesture would change a locked element
    fn touches_geometry(&self) -> bool {
        matches!(self, Self::Move { .. } | Self::Resize { .. })
    }
}

impl Alert {
    /// Apply an edit and return the element as it was before.
    ///
    /// `Insert` returns `None`. Locked elements ignore `Move` and `Resize`
    /// and report no previous state.
    pub fn apply(&mut self, edit: AlertEdit) -> AlertResult<Option<AlertElement>> {
        let total_time = self.total_time;

        match edit {
            AlertEdit::Insert(element) => {
                if self.element(element.id).is_some() {
                    return Err(AlertError::DuplicateElement(element.id));
                }
                let mut element = element;
                clamp_window(&mut element, total_time);
                self.add_element(element);
                Ok(None)
            }
            AlertEdit::Remove(id) => self
                .remove_element(id)
                .map(Some)
                .ok_or(AlertError::UnknownElement(id)),
            AlertEdit::Replace(element) => {
                let id = element.id;
                let slot = self.element_mut(id).ok_or(AlertError::UnknownElement(id))?;
                let mut element = element;
                clamp_window(&mut element, total_time);
                Ok(Some(std::mem::replace(slot, element)))
            }
            edit => {
                let id = edit.target();
                let element = self.element_mut(id).ok_or(AlertError::UnknownElement(id))?;
                if element.locked && edit.touches_geometry() {
                    tracing::debug!("ignoring {} on locked element {}", edit.description(), id);
                    return Ok(None);
                }

                let previous = element.clone();
                match edit {
                    AlertEdit::Move { x, y, .. } => {
                        element.pos_x = x;
                        element.pos_y = y;
                    }
                    AlertEdit::Resize { width, height, .. } => {
                        element.width = width.max(MIN_ELEMENT_SIZE);
                        element.height = height.max(MIN_ELEMENT_SIZE);
                    }
                    AlertEdit::SetStartTime { ms, .. } => {
                        element.start_time = ms.clamp(Milliseconds::ZERO, total_time);
                    }
                    AlertEdit::SetDuration { ms, .. } => {
                        element.duration = ms.max(MIN_DURATION);
                    }
                    AlertEdit::Replace(_) | AlertEdit::Insert(_) | AlertEdit::Remove(_) => {}
                }
                Ok(Some(previous))
            }
        }
    }

    /// Put an element back where it was, used to undo a removal
    pub fn restore(&mut self, index: usize, element: AlertElement) {
        self.insert_element_at(index, element);
    }
}

fn clamp_window(element: &mut AlertElement, total_time: Milliseconds) {
    element.start_time = element.start_time.clamp(Milliseconds::ZERO, total_time);
    element.duration = element.duration.max(MIN_DURATION);
}
