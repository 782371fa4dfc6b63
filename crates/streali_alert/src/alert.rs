// SPDX-License-Identifier: MIT OR Apache-2.0
//! The alert document: a canvas, a total running time and its elements.

use crate::element::{AlertElement, ElementId};
use crate::units::{Milliseconds, Pixels};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default canvas edge length
pub const DEFAULT_CANVAS_SIZE: Pixels = Pixels(1080.0);

/// Default alert length
pub const DEFAULT_TOTAL_TIME: Milliseconds = Milliseconds(10_000.0);

/// Errors raised by document operations
#[derive(Debug, Error)]
pub enum AlertError {
    /// No element with this id
    #[error("unknown element: {0}")]
    UnknownElement(ElementId),
    /// An element with this id already exists
    #[error("element already exists: {0}")]
    DuplicateElement(ElementId),
    /// RON encode/decode failure
    #[error("alert format error: {0}")]
    Format(String),
}

/// Result type for document operations
pub type AlertResult<T> = Result<T, AlertError>;

/// Unique identifier for an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub Uuid);

impl AlertId {
    /// Create a new random alert ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

/// An overlay alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert ID
    pub id: AlertId,
    /// Alert name
    pub name: String,
    /// Canvas width
    pub canvas_width: Pixels,
    /// Canvas height
    pub canvas_height: Pixels,
    /// Length of the alert; the timeline spans this
    pub total_time: Milliseconds,
    elements: IndexMap<ElementId, AlertElement>,
}

impl Alert {
    /// Create an empty alert
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AlertId::new(),
            name: name.into(),
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
            total_time: DEFAULT_TOTAL_TIME,
            elements: IndexMap::new(),
        }
    }

    /// Add an element
    pub fn add_element(&mut self, element: AlertElement) -> ElementId {
        let id = element.id;
        self.elements.insert(id, element);
        id
    }

    /// Insert an element at a position in the draw order
    pub(crate) fn insert_element_at(&mut self, index: usize, element: AlertElement) {
        let index = index.min(self.elements.len());
        self.elements.shift_insert(index, element.id, element);
    }

    /// Remove an element, keeping the order of the rest
    pub fn remove_element(&mut self, id: ElementId) -> Option<AlertElement> {
        self.elements.shift_remove(&id)
    }

    /// Get an element
    pub fn element(&self, id: ElementId) -> Option<&AlertElement> {
        self.elements.get(&id)
    }

    /// Get a mutable element
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut AlertElement> {
        self.elements.get_mut(&id)
    }

    /// Position of an element in the draw order
    pub fn element_index(&self, id: ElementId) -> Option<usize> {
        self.elements.get_index_of(&id)
    }

    /// All elements in insertion order
    pub fn elements(&self) -> impl Iterator<Item = &AlertElement> {
        self.elements.values()
    }

    /// Element count
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Elements on screen at `timestamp`
    pub fn visible_elements(&self, timestamp: Milliseconds) -> impl Iterator<Item = &AlertElement> {
        self.elements.values().filter(move |e| e.is_visible_at(timestamp))
    }

    /// Latest end time over all elements
    pub fn content_duration(&self) -> Milliseconds {
        self.elements
            .values()
            .map(AlertElement::end_time)
            .fold(Milliseconds::ZERO, Milliseconds::max)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> AlertResult<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        ron::ser::to_string_pretty(self, config).map_err(|e| AlertError::Format(e.to_string()))
    }

    /// Parse from RON
    pub fn from_ron_str(source: &str) -> AlertResult<Self> {
        ron::from_str(source).map_err(|e| AlertError::Format(e.to_string()))
    }
}

impl Default for Alert {
    fn default() -> Self {
        Self::new("Untitled Alert")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;

    #[test]
    fn test_new_alert_defaults() {
        let alert = Alert::default();
        assert_eq!(alert.canvas_width, Pixels(1080.0));
        assert_eq!(alert.canvas_height, Pixels(1080.0));
        assert_eq!(alert.total_time, Milliseconds(10_000.0));
        assert_eq!(alert.element_count(), 0);
    }

    #[test]
    fn test_elements_keep_insertion_order() {
        let mut alert = Alert::default();
        let a = alert.add_element(AlertElement::new(ElementType::Text));
        let b = alert.add_element(AlertElement::new(ElementType::Image));
        let c = alert.add_element(AlertElement::new(ElementType::Audio));

        alert.remove_element(b);
        let ids: Vec<_> = alert.elements().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_visible_elements_filters_by_window() {
        let mut alert = Alert::default();
        let early = alert.add_element(
            AlertElement::new(ElementType::Text).with_window(Milliseconds(0.0), Milliseconds(1000.0)),
        );
        let late = alert.add_element(
            AlertElement::new(ElementType::Image).with_window(Milliseconds(1000.0), Milliseconds(500.0)),
        );

        let at = |t: f32| -> Vec<ElementId> {
            alert.visible_elements(Milliseconds(t)).map(|e| e.id).collect()
        };
        assert_eq!(at(500.0), vec![early]);
        assert_eq!(at(1000.0), vec![early, late]);
        assert_eq!(at(1600.0), Vec::<ElementId>::new());
    }

    #[test]
    fn test_content_duration_is_latest_end() {
        let mut alert = Alert::default();
        assert_eq!(alert.content_duration(), Milliseconds::ZERO);

        alert.add_element(AlertElement::new(ElementType::Text).with_window(Milliseconds(500.0), Milliseconds(4000.0)));
        alert.add_element(AlertElement::new(ElementType::Audio).with_window(Milliseconds(0.0), Milliseconds(2000.0)));
        assert_eq!(alert.content_duration(), Milliseconds(4500.0));
    }

    #[test]
    fn test_ron_round_trip() {
        let mut alert = Alert::new("Follow alert");
        alert.add_element(AlertElement::new(ElementType::Text).with_position(40.0, 60.0));
        alert.add_element(AlertElement::new(ElementType::Lottie));

        let text = alert.to_ron_string().unwrap();
        let loaded = Alert::from_ron_str(&text).unwrap();
        assert_eq!(loaded, alert);
    }

    #[test]
    fn test_malformed_document_is_a_format_error() {
        let err = Alert::from_ron_str("(name: ").unwrap_err();
        assert!(matches!(err, AlertError::Format(_)));
    }
}
