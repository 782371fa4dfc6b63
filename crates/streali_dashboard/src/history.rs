// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history for alert edits.
//!
//! Every operation stores the affected element before and after the change
//! as a bincode snapshot. Undo writes the "before" state back into the
//! document, redo writes the "after" state. An element that did not exist
//! on one side is removed, and one that reappears is restored at its old
//! position in the draw order.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use streali_alert::{Alert, AlertElement, ElementId};
use thiserror::Error;

/// Maximum number of operations kept in history
pub const MAX_HISTORY: usize = 100;

/// Errors from history operations
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Undo stack is empty
    #[error("Nothing to undo")]
    NothingToUndo,
    /// Redo stack is empty
    #[error("Nothing to redo")]
    NothingToRedo,
    /// Snapshot encode/decode failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// State of one element at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementState {
    /// Element the state belongs to
    pub id: ElementId,
    /// Position in the draw order, if present
    pub index: Option<usize>,
    /// The element, or `None` if it did not exist
    pub element: Option<AlertElement>,
}

impl ElementState {
    /// Capture the current state of `id`
    pub fn capture(alert: &Alert, id: ElementId) -> Self {
        Self {
            id,
            index: alert.element_index(id),
            element: alert.element(id).cloned(),
        }
    }

    /// Write this state back into the document
    pub fn restore_into(self, alert: &mut Alert) {
        let exists = alert.element(self.id).is_some();
        match self.element {
            Some(element) if exists => {
                if let Some(slot) = alert.element_mut(self.id) {
                    *slot = element;
                }
            }
            Some(element) => {
                let index = self.index.unwrap_or(alert.element_count());
                alert.restore(index, element);
            }
            None => {
                alert.remove_element(self.id);
            }
        }
    }
}

/// A serialized element state
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    data: Vec<u8>,
}

impl StateSnapshot {
    /// Encode a state
    pub fn from_state(state: &ElementState) -> Result<Self, HistoryError> {
        Ok(Self {
            data: bincode::serialize(state)?,
        })
    }

    /// Decode the state
    pub fn to_state(&self) -> Result<ElementState, HistoryError> {
        Ok(bincode::deserialize(&self.data)?)
    }
}

/// One undoable operation
#[derive(Debug, Clone)]
pub struct Operation {
    /// Menu label, e.g. "Move element"
    pub description: String,
    before: StateSnapshot,
    after: StateSnapshot,
}

impl Operation {
    /// Record a change from `before` to `after`
    pub fn new(
        description: impl Into<String>,
        before: &ElementState,
        after: &ElementState,
    ) -> Result<Self, HistoryError> {
        Ok(Self {
            description: description.into(),
            before: StateSnapshot::from_state(before)?,
            after: StateSnapshot::from_state(after)?,
        })
    }
}

/// Undo/redo stacks
#[derive(Debug, Default)]
pub struct History {
    undo_stack: VecDeque<Operation>,
    redo_stack: VecDeque<Operation>,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation. Clears the redo stack.
    pub fn push(&mut self, operation: Operation) {
        tracing::debug!("History: {}", operation.description);
        self.redo_stack.clear();
        self.undo_stack.push_back(operation);
        while self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.pop_front();
        }
    }

    /// Record a change between two captured states, skipping no-ops
    pub fn record(
        &mut self,
        description: &str,
        before: &ElementState,
        after: &ElementState,
    ) -> Result<(), HistoryError> {
        if before == after {
            return Ok(());
        }
        self.push(Operation::new(description, before, after)?);
        Ok(())
    }

    /// Revert the last operation
    pub fn undo(&mut self, alert: &mut Alert) -> Result<String, HistoryError> {
        let operation = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        let state = match operation.before.to_state() {
            Ok(state) => state,
            Err(e) => {
                self.undo_stack.push_back(operation);
                return Err(e);
            }
        };
        state.restore_into(alert);
        let description = operation.description.clone();
        self.redo_stack.push_back(operation);
        Ok(description)
    }

    /// Reapply the last undone operation
    pub fn redo(&mut self, alert: &mut Alert) -> Result<String, HistoryError> {
        let operation = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        let state = match operation.after.to_state() {
            Ok(state) => state,
            Err(e) => {
                self.redo_stack.push_back(operation);
                return Err(e);
            }
        };
        state.restore_into(alert);
        let description = operation.description.clone();
        self.undo_stack.push_back(operation);
        Ok(description)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|op| op.description.as_str())
    }

    /// Get the description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|op| op.description.as_str())
    }

    /// Number of undoable operations
    #[cfg(test)]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
