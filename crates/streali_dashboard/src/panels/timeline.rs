// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline panel - drives the preview clock and feeds bar edits back into
//! the document.

use crate::state::DashboardState;
use streali_alert::{Milliseconds, TimeScale, TimelineResponse, TimelineState};

/// The timeline panel
pub struct TimelinePanel {
    /// Widget state: clock, scale and scroll
    pub timeline: TimelineState,
}

impl TimelinePanel {
    /// Create a timeline panel at the given scale
    pub fn new(pixels_per_second: f32) -> Self {
        let mut timeline = TimelineState::new(TimeScale::default());
        timeline.set_zoom(pixels_per_second);
        Self { timeline }
    }

    /// Current playhead position
    pub fn playhead(&self) -> Milliseconds {
        self.timeline.playback.time
    }

    /// Current horizontal scale
    pub fn pixels_per_second(&self) -> f32 {
        self.timeline.scale.pixels_per_second
    }

    /// Advance the preview clock by the frame time
    pub fn tick(&mut self, ctx: &egui::Context, state: &DashboardState) {
        if !self.timeline.playback.is_playing() {
            return;
        }
        let dt = ctx.input(|i| i.stable_dt).min(0.1);
        self.timeline.playback.update(dt, state.alert.total_time);
        ctx.request_repaint();
    }

    /// Render the timeline panel
    pub fn ui(&mut self, ui: &mut egui::Ui, state: &mut DashboardState) {
        let response = self.timeline.ui(ui, &state.alert, state.selected);
        apply_response(state, response);
    }
}

impl Default for TimelinePanel {
    fn default() -> Self {
        Self::new(TimeScale::default().pixels_per_second)
    }
}

/// Apply what the timeline widget produced to the document
fn apply_response(state: &mut DashboardState, response: TimelineResponse) {
    for edit in response.edits {
        let description = edit.description();
        if let Err(e) = state.apply_edit(edit) {
            tracing::warn!("Timeline edit '{}' rejected: {}", description, e);
        }
    }

    if let Some(id) = response.selected {
        state.select(Some(id));
    } else if response.cleared_selection {
        state.select(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streali_alert::{AlertEdit, AlertElement, ElementType};

    #[test]
    fn test_bar_commits_are_recorded() {
        let mut state = DashboardState::new();
        let id = state.alert.add_element(AlertElement::new(ElementType::Text));

        let response = TimelineResponse {
            edits: vec![
                AlertEdit::SetStartTime { id, ms: Milliseconds(1500.0) },
                AlertEdit::SetDuration { id, ms: Milliseconds(2000.0) },
            ],
            selected: Some(id),
            cleared_selection: false,
        };
        apply_response(&mut state, response);

        let element = state.alert.element(id).unwrap();
        assert_eq!(element.start_time, Milliseconds(1500.0));
        assert_eq!(element.duration, Milliseconds(2000.0));
        assert_eq!(state.selected, Some(id));
        assert_eq!(state.history.undo_len(), 2);
        assert!(state.has_unsaved_changes());
    }

    #[test]
    fn test_empty_click_clears_selection() {
        let mut state = DashboardState::new();
        let id = state.alert.add_element(AlertElement::new(ElementType::Image));
        state.select(Some(id));

        apply_response(
            &mut state,
            TimelineResponse {
                cleared_selection: true,
                ..TimelineResponse::default()
            },
        );
        assert_eq!(state.selected, None);
    }

    #[test]
    fn test_zoom_is_taken_from_config() {
        let panel = TimelinePanel::new(250.0);
        assert_eq!(panel.pixels_per_second(), 250.0);
        assert_eq!(panel.playhead(), Milliseconds::ZERO);
    }
}
