// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline widget.
//!
//! Features:
//! - Playback toolbar with time readout and zoom
//! - Time ruler with a draggable playhead
//! - One row per element: icon, title, colored bar and a resize handle
//!
//! The widget never mutates the alert. Bar gestures are previewed on the
//! strip and returned as [`AlertEdit`]s when the pointer is released.

use crate::alert::Alert;
use crate::edit::AlertEdit;
use crate::element::ElementId;
use crate::playback::Playback;
use crate::timeline::{StripCommit, TimeScale, TimelineEntry, TimelineStrip, BAR_HEIGHT};
use crate::units::{Milliseconds, Pixels};
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use std::collections::HashMap;

const ROW_HEIGHT: f32 = BAR_HEIGHT.0 + 8.0;
const ROW_HEADER_WIDTH: f32 = 180.0;
const RULER_HEIGHT: f32 = 28.0;
const HANDLE_WIDTH: f32 = 8.0;
const PLAYHEAD_WIDTH: f32 = 2.0;
const MIN_ZOOM: f32 = 20.0;
const MAX_ZOOM: f32 = 500.0;

/// Drag operation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragOperation {
    /// Not dragging
    #[default]
    None,
    /// Dragging the playhead
    Playhead,
    /// Moving or resizing a bar
    Strip(ElementId),
}

/// What the timeline produced this frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineResponse {
    /// Edits committed by finished gestures
    pub edits: Vec<AlertEdit>,
    /// Element the user clicked
    pub selected: Option<ElementId>,
    /// The user clicked empty timeline space
    pub cleared_selection: bool,
}

/// Turn a finished strip gesture into a document edit
pub fn commit_to_edit(id: ElementId, commit: StripCommit) -> AlertEdit {
    match commit {
        StripCommit::Moved(ms) => AlertEdit::SetStartTime { id, ms },
        StripCommit::Resized(ms) => AlertEdit::SetDuration { id, ms },
    }
}

/// Timeline editor state
pub struct TimelineState {
    /// Preview clock
    pub playback: Playback,
    /// Horizontal scale
    pub scale: TimeScale,
    /// Horizontal scroll in timeline pixels
    pub scroll_offset: f32,
    /// Vertical scroll in screen points
    pub vertical_scroll: f32,
    strips: HashMap<ElementId, TimelineStrip>,
    drag_op: DragOperation,
}

impl TimelineState {
    /// Create a timeline at the given scale
    pub fn new(scale: TimeScale) -> Self {
        Self {
            playback: Playback::new(),
            scale,
            scroll_offset: 0.0,
            vertical_scroll: 0.0,
            strips: HashMap::new(),
            drag_op: DragOperation::None,
        }
    }

    /// Current drag operation
    pub fn drag_op(&self) -> DragOperation {
        self.drag_op
    }

    /// Convert a time to a screen x inside a content area starting at `origin_x`
    fn time_to_x(&self, origin_x: f32, time: Milliseconds) -> f32 {
        origin_x + self.scale.time_to_pixel(time).0 - self.scroll_offset
    }

    /// Convert a screen x back to a time
    fn x_to_time(&self, origin_x: f32, x: f32) -> Milliseconds {
        self.scale.pixel_to_time(Pixels(x - origin_x + self.scroll_offset))
    }

    /// Change the zoom, keeping it within limits
    pub fn set_zoom(&mut self, pixels_per_second: f32) {
        self.scale = TimeScale::new(pixels_per_second.clamp(MIN_ZOOM, MAX_ZOOM));
    }

    /// Bring the cached strips in line with the document
    fn sync_strips(&mut self, alert: &Alert) {
        self.strips.retain(|id, _| alert.element(*id).is_some());

        for element in alert.elements() {
            let entry = TimelineEntry::from_element(element);
            let stale = match self.strips.get_mut(&element.id) {
                Some(strip) if strip.is_active() => false,
                Some(strip) if strip.scale() == self.scale => {
                    strip.sync(&entry, alert.total_time);
                    false
                }
                _ => true,
            };
            if stale {
                self.strips
                    .insert(element.id, TimelineStrip::new(&entry, alert.total_time, self.scale));
            }
        }
    }

    /// Render the timeline
    pub fn ui(&mut self, ui: &mut egui::Ui, alert: &Alert, selected: Option<ElementId>) -> TimelineResponse {
        let mut response = TimelineResponse::default();
        self.sync_strips(alert);

        self.render_toolbar(ui, alert);
        ui.separator();

        let remaining = ui.available_rect_before_wrap();
        let ruler_rect = Rect::from_min_size(remaining.min, Vec2::new(remaining.width(), RULER_HEIGHT));
        let rows_rect = Rect::from_min_max(Pos2::new(remaining.min.x, ruler_rect.max.y), remaining.max);

        // Empty-space clicks sit underneath the bars
        let background = ui.interact(rows_rect, ui.id().with("timeline_background"), Sense::click());
        if background.clicked() {
            response.cleared_selection = true;
        }

        self.render_ruler(ui, ruler_rect, alert);
        self.render_rows(ui, rows_rect, alert, selected, &mut response);
        self.handle_input(ui, remaining, alert);

        ui.allocate_rect(remaining, Sense::hover());
        response
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui, alert: &Alert) {
        ui.horizontal(|ui| {
            let play_icon = if self.playback.is_playing() { "\u{23f8}" } else { "\u{25b6}" };
            if ui.button(play_icon).on_hover_text("Play/Pause (Space)").clicked() {
                self.playback.toggle(alert.total_time);
            }

            if ui.button("\u{23f9}").on_hover_text("Stop").clicked() {
                self.playback.stop();
            }

            ui.separator();
            ui.monospace(format!(
                "{} / {}",
                self.playback.time.display(),
                alert.total_time.display()
            ));

            ui.separator();
            ui.checkbox(&mut self.playback.looping, "Loop");
            ui.add(
                egui::DragValue::new(&mut self.playback.speed)
                    .range(0.1..=4.0)
                    .speed(0.1)
                    .suffix("x"),
            );

            ui.separator();
            ui.label("Zoom:");
            let mut pps = self.scale.pixels_per_second;
            if ui.button("-").clicked() {
                pps *= 0.8;
            }
            ui.add(
                egui::DragValue::new(&mut pps)
                    .range(MIN_ZOOM..=MAX_ZOOM)
                    .speed(1.0)
                    .suffix(" px/s"),
            );
            if ui.button("+").clicked() {
                pps *= 1.25;
            }
            if pps != self.scale.pixels_per_second {
                self.set_zoom(pps);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{} elements", alert.element_count()));
            });
        });
    }

    fn render_ruler(&mut self, ui: &mut egui::Ui, rect: Rect, alert: &Alert) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(40));

        let origin_x = rect.min.x + ROW_HEADER_WIDTH;
        let pps = self.scale.pixels_per_second;
        let tick_ms = if pps > 200.0 {
            100.0
        } else if pps > 50.0 {
            500.0
        } else {
            1000.0
        };
        let major_ms = tick_ms * 2.0;

        let mut time = 0.0;
        while time <= alert.total_time.0 {
            let x = self.time_to_x(origin_x, Milliseconds(time));
            if x > rect.max.x {
                break;
            }
            if x >= origin_x {
                let is_major = (time / major_ms).fract().abs() < 0.001;
                let tick_height = if is_major { 12.0 } else { 6.0 };
                painter.line_segment(
                    [Pos2::new(x, rect.max.y - tick_height), Pos2::new(x, rect.max.y)],
                    Stroke::new(1.0, Color32::from_gray(if is_major { 180 } else { 100 })),
                );
                if is_major {
                    painter.text(
                        Pos2::new(x + 2.0, rect.min.y + 4.0),
                        egui::Align2::LEFT_TOP,
                        format!("{:.1}s", time / 1000.0),
                        egui::FontId::monospace(10.0),
                        Color32::from_gray(180),
                    );
                }
            }
            time += tick_ms;
        }

        let playhead_x = self.time_to_x(origin_x, self.playback.time);
        if playhead_x >= origin_x && playhead_x <= rect.max.x {
            painter.add(egui::Shape::convex_polygon(
                vec![
                    Pos2::new(playhead_x, rect.max.y - 8.0),
                    Pos2::new(playhead_x - 6.0, rect.max.y),
                    Pos2::new(playhead_x + 6.0, rect.max.y),
                ],
                Color32::from_rgb(255, 100, 100),
                Stroke::NONE,
            ));
        }

        let header = ui.interact(rect, ui.id().with("timeline_ruler"), Sense::click_and_drag());
        if header.drag_started() {
            self.drag_op = DragOperation::Playhead;
        }
        if header.dragged() || header.clicked() {
            if let Some(pos) = header.interact_pointer_pos() {
                let time = self.x_to_time(origin_x, pos.x);
                self.playback.seek(time, alert.total_time);
            }
        }
        if header.drag_stopped() {
            self.drag_op = DragOperation::None;
        }
    }

    fn render_rows(
        &mut self,
        ui: &mut egui::Ui,
        rect: Rect,
        alert: &Alert,
        selected: Option<ElementId>,
        response: &mut TimelineResponse,
    ) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(30));
        painter.rect_filled(
            Rect::from_min_size(rect.min, Vec2::new(ROW_HEADER_WIDTH, rect.height())),
            0.0,
            Color32::from_gray(35),
        );

        let origin_x = rect.min.x + ROW_HEADER_WIDTH;
        let mut y = rect.min.y - self.vertical_scroll;

        for (index, element) in alert.elements().enumerate() {
            if y > rect.max.y {
                break;
            }
            let row_rect = Rect::from_min_size(Pos2::new(rect.min.x, y), Vec2::new(rect.width(), ROW_HEIGHT));
            y += ROW_HEIGHT;
            if row_rect.max.y < rect.min.y {
                continue;
            }

            let entry = TimelineEntry::from_element(element);
            let is_selected = selected == Some(entry.id);
            let bg = if is_selected {
                Color32::from_rgba_unmultiplied(100, 150, 255, 40)
            } else if index % 2 == 0 {
                Color32::from_gray(32)
            } else {
                Color32::from_gray(28)
            };
            painter.rect_filled(row_rect, 0.0, bg);

            painter.text(
                Pos2::new(row_rect.min.x + 10.0, row_rect.center().y),
                egui::Align2::LEFT_CENTER,
                format!("{}  {}", entry.element_type.icon(), entry.title),
                egui::FontId::proportional(12.0),
                Color32::from_gray(200),
            );
            if element.locked {
                painter.text(
                    Pos2::new(origin_x - 10.0, row_rect.center().y),
                    egui::Align2::CENTER_CENTER,
                    "\u{1f512}",
                    egui::FontId::proportional(10.0),
                    Color32::from_gray(150),
                );
            }

            if let Some(commit) = self.render_bar(ui, &painter, origin_x, row_rect, &entry, is_selected, response) {
                response.edits.push(commit_to_edit(entry.id, commit));
            }

            painter.line_segment(
                [Pos2::new(row_rect.min.x, row_rect.max.y), Pos2::new(row_rect.max.x, row_rect.max.y)],
                Stroke::new(1.0, Color32::from_gray(45)),
            );
        }

        let playhead_x = self.time_to_x(origin_x, self.playback.time);
        if playhead_x >= origin_x && playhead_x <= rect.max.x {
            painter.line_segment(
                [Pos2::new(playhead_x, rect.min.y), Pos2::new(playhead_x, rect.max.y)],
                Stroke::new(PLAYHEAD_WIDTH, Color32::from_rgb(255, 100, 100)),
            );
        }
    }

    /// Draw one bar and drive its gesture. Returns a commit on release.
    fn render_bar(
        &mut self,
        ui: &mut egui::Ui,
        painter: &egui::Painter,
        origin_x: f32,
        row_rect: Rect,
        entry: &TimelineEntry,
        is_selected: bool,
        response: &mut TimelineResponse,
    ) -> Option<StripCommit> {
        let scroll = self.scroll_offset;
        let strip = self.strips.get_mut(&entry.id)?;

        let container_rect = Rect::from_min_size(
            Pos2::new(origin_x - scroll, row_rect.min.y + 4.0),
            Vec2::new(strip.container.0, BAR_HEIGHT.0),
        );
        painter.rect_filled(container_rect, 2.0, Color32::from_gray(24));

        let bar_rect = Rect::from_min_size(
            Pos2::new(container_rect.min.x + strip.left.0, container_rect.min.y),
            Vec2::new(strip.width.0, BAR_HEIGHT.0),
        );
        let handle_rect = Rect::from_min_max(
            Pos2::new(bar_rect.max.x - HANDLE_WIDTH, bar_rect.min.y),
            bar_rect.max,
        );

        let [r, g, b] = entry.color;
        let fill = if strip.is_active() {
            Color32::from_rgba_unmultiplied(r, g, b, 180)
        } else {
            Color32::from_rgb(r, g, b)
        };
        painter.rect_filled(bar_rect, 3.0, fill);
        if is_selected {
            painter.rect_stroke(bar_rect, 3.0, Stroke::new(2.0, Color32::WHITE));
        }
        painter.rect_filled(handle_rect, 2.0, Color32::from_black_alpha(90));
        painter.text(
            bar_rect.left_center() + Vec2::new(6.0, 0.0),
            egui::Align2::LEFT_CENTER,
            entry.element_type.icon(),
            egui::FontId::proportional(14.0),
            Color32::WHITE,
        );

        let bar_id = ui.id().with(("timeline_bar", entry.id));
        let bar = ui.interact(bar_rect, bar_id, Sense::click_and_drag());
        // Registered after the bar so it wins the pointer on overlap
        let handle = ui
            .interact(handle_rect, bar_id.with("handle"), Sense::drag())
            .on_hover_cursor(egui::CursorIcon::ResizeHorizontal);

        if bar.clicked() || bar.drag_started() || handle.drag_started() {
            response.selected = Some(entry.id);
        }

        if handle.drag_started() {
            strip.begin_resize();
            self.drag_op = DragOperation::Strip(entry.id);
        } else if bar.drag_started() {
            strip.begin_move();
            self.drag_op = DragOperation::Strip(entry.id);
        }

        if handle.dragged() {
            strip.drag_by(Pixels(handle.drag_delta().x));
        } else if bar.dragged() {
            strip.drag_by(Pixels(bar.drag_delta().x));
        }

        if ui.input(|i| i.key_pressed(egui::Key::Escape)) && strip.is_active() {
            strip.cancel();
            self.drag_op = DragOperation::None;
            return None;
        }

        if bar.drag_stopped() || handle.drag_stopped() {
            self.drag_op = DragOperation::None;
            return strip.end();
        }
        None
    }

    fn handle_input(&mut self, ui: &mut egui::Ui, rect: Rect, alert: &Alert) {
        if !ui.ctx().wants_keyboard_input() {
            ui.input(|input| {
                if input.key_pressed(egui::Key::Space) {
                    self.playback.toggle(alert.total_time);
                }
                if input.key_pressed(egui::Key::Home) {
                    self.playback.seek(Milliseconds::ZERO, alert.total_time);
                }
                if input.key_pressed(egui::Key::End) {
                    self.playback.seek(alert.total_time, alert.total_time);
                }
            });
        }

        let hovered = ui.rect_contains_pointer(rect);
        if !hovered {
            return;
        }

        let (scroll, ctrl, shift) = ui.input(|i| (i.smooth_scroll_delta, i.modifiers.ctrl, i.modifiers.shift));
        if ctrl {
            self.set_zoom(self.scale.pixels_per_second * (1.0 + scroll.y * 0.01));
        } else if shift {
            let max_scroll = self.scale.time_to_pixel(alert.total_time).0;
            self.scroll_offset = (self.scroll_offset - scroll.y).clamp(0.0, max_scroll);
        } else {
            let content = alert.element_count() as f32 * ROW_HEIGHT;
            let max_scroll = (content - rect.height() + RULER_HEIGHT).max(0.0);
            self.vertical_scroll = (self.vertical_scroll - scroll.y).clamp(0.0, max_scroll);
        }
    }
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(TimeScale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{AlertElement, ElementType};

    #[test]
    fn test_time_and_x_follow_scroll() {
        let mut state = TimelineState::default();
        assert_eq!(state.time_to_x(200.0, Milliseconds(1500.0)), 350.0);

        state.scroll_offset = 100.0;
        assert_eq!(state.time_to_x(200.0, Milliseconds(1500.0)), 250.0);
        assert_eq!(state.x_to_time(200.0, 250.0), Milliseconds(1500.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut state = TimelineState::default();
        state.set_zoom(5.0);
        assert_eq!(state.scale.pixels_per_second, MIN_ZOOM);
        state.set_zoom(10_000.0);
        assert_eq!(state.scale.pixels_per_second, MAX_ZOOM);
    }

    #[test]
    fn test_commit_maps_to_edit() {
        let id = ElementId::new();
        assert_eq!(
            commit_to_edit(id, StripCommit::Moved(Milliseconds(700.0))),
            AlertEdit::SetStartTime { id, ms: Milliseconds(700.0) }
        );
        assert_eq!(
            commit_to_edit(id, StripCommit::Resized(Milliseconds(1200.0))),
            AlertEdit::SetDuration { id, ms: Milliseconds(1200.0) }
        );
    }

    #[test]
    fn test_strips_follow_document_and_scale() {
        let mut alert = Alert::default();
        let id = alert.add_element(
            AlertElement::new(ElementType::Text).with_window(Milliseconds(1000.0), Milliseconds(2000.0)),
        );
        let mut state = TimelineState::default();

        state.sync_strips(&alert);
        assert_eq!(state.strips[&id].left, Pixels(100.0));

        state.set_zoom(200.0);
        state.sync_strips(&alert);
        assert_eq!(state.strips[&id].left, Pixels(200.0));
        assert_eq!(state.strips[&id].width, Pixels(400.0));

        alert.remove_element(id);
        state.sync_strips(&alert);
        assert!(state.strips.is_empty());
    }
}
