// SPDX-License-Identifier: MIT OR Apache-2.0
//! Which event types the dashboard shows.

use crate::event::EventKind;
use serde::{Deserialize, Serialize};

/// One checkbox in the event filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCheck {
    /// Label shown next to the checkbox
    pub label: String,
    /// Whether events of this type are shown
    pub checked: bool,
    /// Wire type code
    #[serde(rename = "type")]
    pub type_code: u16,
}

impl EventCheck {
    /// A checked entry for a known kind
    pub fn for_kind(kind: EventKind) -> Self {
        Self {
            label: kind.label().to_string(),
            checked: true,
            type_code: kind.code(),
        }
    }
}

/// Ordered list of event checkboxes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFilter {
    checks: Vec<EventCheck>,
}

impl EventFilter {
    /// Build from a stored list
    pub fn from_checks(checks: Vec<EventCheck>) -> Self {
        Self { checks }
    }

    /// All entries in display order
    pub fn checks(&self) -> &[EventCheck] {
        &self.checks
    }

    /// Set one entry by label. Returns whether anything changed.
    pub fn set_checked(&mut self, label: &str, value: bool) -> bool {
        match self.checks.iter_mut().find(|check| check.label == label) {
            Some(check) if check.checked != value => {
                check.checked = value;
                true
            }
            _ => false,
        }
    }

    /// Restore the default list with everything checked
    pub fn select_all(&mut self) {
        *self = Self::default();
    }

    /// Codes of the checked entries
    pub fn checked_types(&self) -> Vec<u16> {
        self.checks
            .iter()
            .filter(|check| check.checked)
            .map(|check| check.type_code)
            .collect()
    }

    /// Whether events with this code pass the filter
    pub fn allows(&self, type_code: u16) -> bool {
        self.checks
            .iter()
            .any(|check| check.checked && check.type_code == type_code)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            checks: EventKind::ALL.into_iter().map(EventCheck::for_kind).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists_all_kinds_checked() {
        let filter = EventFilter::default();
        let labels: Vec<_> = filter.checks().iter().map(|c| c.label.as_str()).collect();

        assert_eq!(labels, vec![
            "Follow", "Bits", "Subscribe", "Subscription Gift", "Raid",
            "Hype Train Begin", "Hype Train End", "Goal Begin", "Goal End",
        ]);
        assert_eq!(filter.checked_types(), vec![10, 20, 30, 31, 40, 50, 52, 60, 62]);
    }

    #[test]
    fn test_set_checked_toggles_one_entry() {
        let mut filter = EventFilter::default();

        assert!(filter.set_checked("Raid", false));
        assert!(!filter.allows(40));
        assert!(filter.allows(10));
        assert!(!filter.set_checked("Raid", false));
        assert!(!filter.set_checked("Nonexistent", false));
        assert_eq!(filter.checked_types().len(), 8);
    }

    #[test]
    fn test_select_all_resets_to_defaults() {
        let mut filter = EventFilter::from_checks(vec![EventCheck {
            label: "Follow".to_string(),
            checked: false,
            type_code: 10,
        }]);

        filter.select_all();
        assert_eq!(filter, EventFilter::default());
    }

    #[test]
    fn test_json_shape() {
        let filter = EventFilter::from_checks(vec![EventCheck::for_kind(EventKind::Bits)]);
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(json, r#"[{"label":"Bits","checked":true,"type":20}]"#);
    }
}
