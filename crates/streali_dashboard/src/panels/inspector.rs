// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inspector panel - properties of the selected element.
//!
//! Edits are made on a copy of the element and previewed live. A run of
//! changes (a whole `DragValue` drag, or typing into a field) is recorded as
//! one undo step once the widget is released.

use crate::state::DashboardState;
use streali_alert::{AlertEdit, AlertElement, ElementId, ElementSettings, Milliseconds, Pixels, NO_ANIMATION};

const ENTRANCE_ANIMATIONS: [&str; 6] = [NO_ANIMATION, "fadeIn", "slideInUp", "slideInDown", "zoomIn", "bounceIn"];
const EXIT_ANIMATIONS: [&str; 6] = [NO_ANIMATION, "fadeOut", "slideOutUp", "slideOutDown", "zoomOut", "bounceOut"];

/// Tracks which widgets changed or are still held this frame
#[derive(Default)]
struct EditTracker {
    changed: bool,
    active: bool,
}

impl EditTracker {
    fn track(&mut self, response: egui::Response) -> egui::Response {
        self.changed |= response.changed();
        self.active |= response.dragged() || response.has_focus();
        response
    }
}

/// The inspector panel for editing the selected element
#[derive(Default)]
pub struct InspectorPanel {
    /// Element with an open edit run
    editing: Option<ElementId>,
}

impl InspectorPanel {
    /// Create a new inspector panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the inspector panel
    pub fn ui(&mut self, ui: &mut egui::Ui, state: &mut DashboardState) {
        // Undo or a canvas gesture takes the run over; a selection change closes it
        if let Some(id) = self.editing {
            if state.gesture_target() != Some(id) {
                self.editing = None;
            } else if state.selected != Some(id) {
                state.end_gesture("Edit element");
                self.editing = None;
            }
        }

        let Some(mut draft) = state.selected_element().cloned() else {
            alert_section(ui, state);
            return;
        };

        let mut tracker = EditTracker::default();
        egui::ScrollArea::vertical().show(ui, |ui| {
            element_header(ui, &mut draft, &mut tracker);
            ui.separator();
            geometry_section(ui, &mut draft, &mut tracker);
            timing_section(ui, &mut draft, state.alert.total_time, &mut tracker);
            settings_section(ui, &mut draft, &mut tracker);
        });

        if tracker.changed {
            if self.editing.is_none() {
                state.begin_gesture(draft.id);
                self.editing = Some(draft.id);
            }
            if let Err(e) = state.preview_edit(AlertEdit::Replace(draft)) {
                tracing::warn!("Inspector edit rejected: {}", e);
            }
        }
        if self.editing.is_some() && !tracker.active {
            state.end_gesture("Edit element");
            self.editing = None;
        }
    }
}

/// Document-level settings shown when nothing is selected
fn alert_section(ui: &mut egui::Ui, state: &mut DashboardState) {
    ui.heading("Alert");
    ui.separator();

    let mut name = state.alert.name.clone();
    let mut total_secs = state.alert.total_time.as_secs();
    let mut width = state.alert.canvas_width.0;
    let mut height = state.alert.canvas_height.0;
    let mut changed = false;

    egui::Grid::new("alert_properties").num_columns(2).show(ui, |ui| {
        ui.label("Name");
        changed |= ui.text_edit_singleline(&mut name).changed();
        ui.end_row();

        ui.label("Duration");
        changed |= ui
            .add(egui::DragValue::new(&mut total_secs).speed(0.1).range(1.0..=120.0).suffix(" s"))
            .changed();
        ui.end_row();

        ui.label("Canvas");
        ui.horizontal(|ui| {
            changed |= ui.add(egui::DragValue::new(&mut width).range(100.0..=3840.0).suffix(" px")).changed();
            ui.label("\u{d7}");
            changed |= ui.add(egui::DragValue::new(&mut height).range(100.0..=3840.0).suffix(" px")).changed();
        });
        ui.end_row();
    });

    if changed {
        state.alert.name = name;
        state.alert.total_time = Milliseconds::from_secs(total_secs);
        state.alert.canvas_width = Pixels(width);
        state.alert.canvas_height = Pixels(height);
        state.mark_dirty();
    }

    ui.add_space(8.0);
    ui.weak(format!("{} elements. Select one to edit it.", state.alert.element_count()));
}

fn element_header(ui: &mut egui::Ui, draft: &mut AlertElement, tracker: &mut EditTracker) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(draft.element_type().icon()).size(18.0));
        tracker.track(ui.text_edit_singleline(&mut draft.title));
    });
    ui.horizontal(|ui| {
        ui.weak(draft.element_type().name());
        tracker.track(ui.checkbox(&mut draft.locked, "\u{1f512} Locked"));

        let [r, g, b] = draft.effective_color();
        let mut color = egui::Color32::from_rgb(r, g, b);
        if tracker.track(ui.color_edit_button_srgba(&mut color)).changed() {
            draft.color = Some([color.r(), color.g(), color.b()]);
        }
    });
}

fn geometry_section(ui: &mut egui::Ui, draft: &mut AlertElement, tracker: &mut EditTracker) {
    if !draft.has_area() {
        return;
    }

    egui::CollapsingHeader::new("Position & size")
        .default_open(true)
        .show(ui, |ui| {
            ui.add_enabled_ui(!draft.locked, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Position");
                    tracker.track(ui.add(egui::DragValue::new(&mut draft.pos_x.0).prefix("X: ")));
                    tracker.track(ui.add(egui::DragValue::new(&mut draft.pos_y.0).prefix("Y: ")));
                });
                ui.horizontal(|ui| {
                    ui.label("Size");
                    tracker.track(ui.add(egui::DragValue::new(&mut draft.width.0).range(10.0..=f32::MAX).prefix("W: ")));
                    tracker.track(ui.add(egui::DragValue::new(&mut draft.height.0).range(10.0..=f32::MAX).prefix("H: ")));
                });
            });
        });
}

fn timing_section(ui: &mut egui::Ui, draft: &mut AlertElement, total_time: Milliseconds, tracker: &mut EditTracker) {
    egui::CollapsingHeader::new("Timing")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("timing").num_columns(2).show(ui, |ui| {
                ui.label("Start");
                tracker.track(ui.add(
                    egui::DragValue::new(&mut draft.start_time.0)
                        .range(0.0..=total_time.0)
                        .speed(10.0)
                        .suffix(" ms"),
                ));
                ui.end_row();

                ui.label("Duration");
                tracker.track(ui.add(
                    egui::DragValue::new(&mut draft.duration.0)
                        .range(100.0..=f32::MAX)
                        .speed(10.0)
                        .suffix(" ms"),
                ));
                ui.end_row();

                ui.label("Entrance");
                animation_combo(ui, "animation_in", &mut draft.animation_in, &ENTRANCE_ANIMATIONS, tracker);
                ui.end_row();

                ui.label("Exit");
                animation_combo(ui, "animation_out", &mut draft.animation_out, &EXIT_ANIMATIONS, tracker);
                ui.end_row();
            });
        });
}

fn animation_combo(
    ui: &mut egui::Ui,
    id: &str,
    value: &mut Option<String>,
    options: &[&str],
    tracker: &mut EditTracker,
) {
    let current = value.as_deref().unwrap_or(NO_ANIMATION).to_string();
    egui::ComboBox::from_id_salt(id)
        .selected_text(&current)
        .show_ui(ui, |ui| {
            for option in options {
                if ui.selectable_label(current == *option, *option).clicked() && current != *option {
                    *value = (*option != NO_ANIMATION).then(|| option.to_string());
                    tracker.changed = true;
                }
            }
        });
}

fn settings_section(ui: &mut egui::Ui, draft: &mut AlertElement, tracker: &mut EditTracker) {
    egui::CollapsingHeader::new(format!("{} settings", draft.element_type().name()))
        .default_open(true)
        .show(ui, |ui| match &mut draft.settings {
            ElementSettings::Text(text) => {
                ui.label("Content");
                tracker.track(ui.text_edit_multiline(&mut text.content));
                ui.horizontal(|ui| {
                    tracker.track(ui.add(egui::DragValue::new(&mut text.font_size).range(6.0..=300.0).suffix(" px")));
                    tracker.track(ui.checkbox(&mut text.bold, "Bold"));
                    let [r, g, b, a] = text.color;
                    let mut color = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
                    if tracker.track(ui.color_edit_button_srgba(&mut color)).changed() {
                        text.color = color.to_srgba_unmultiplied();
                    }
                });
            }
            ElementSettings::Image(image) => {
                source_field(ui, &mut image.url, tracker);
                tracker.track(ui.add(egui::Slider::new(&mut image.opacity, 0.0..=1.0).text("Opacity")));
            }
            ElementSettings::Video(video) => {
                source_field(ui, &mut video.url, tracker);
                tracker.track(ui.add(egui::Slider::new(&mut video.volume, 0.0..=1.0).text("Volume")));
                tracker.track(ui.checkbox(&mut video.muted, "Muted"));
            }
            ElementSettings::Lottie(lottie) => {
                source_field(ui, &mut lottie.url, tracker);
                tracker.track(ui.checkbox(&mut lottie.looping, "Loop"));
            }
            ElementSettings::Audio(audio) => {
                source_field(ui, &mut audio.url, tracker);
                tracker.track(ui.add(egui::Slider::new(&mut audio.volume, 0.0..=1.0).text("Volume")));
            }
        });
}

fn source_field(ui: &mut egui::Ui, url: &mut String, tracker: &mut EditTracker) {
    ui.horizontal(|ui| {
        ui.label("Source");
        tracker.track(ui.add(egui::TextEdit::singleline(url).hint_text("URL or file path")));
    });
}
