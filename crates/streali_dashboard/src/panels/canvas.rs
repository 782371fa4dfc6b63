// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas panel - the alert drawn at its real size, with drag and resize.
//!
//! Pointer gestures go through [`CanvasGesture`] and reach the document as
//! `Move`/`Resize` previews. The whole gesture is committed as one undo step
//! on release, and Escape puts the element back.

use crate::media::{MediaCache, MediaState};
use crate::state::DashboardState;
use streali_alert::{
    hit_test, AlertEdit, AlertElement, CanvasGesture, ElementId, ElementSettings, ElementType, HitZone, Milliseconds,
    ResizeEdges, TextSettings,
};

/// Edge grab distance in screen points
const HANDLE_SIZE: f32 = 6.0;
const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 2.0;
const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(80, 160, 255);
const HIDDEN_OPACITY: f32 = 0.3;

/// The canvas editor panel
pub struct CanvasPanel {
    /// Screen points per canvas pixel
    pub zoom: f32,
    /// Only draw elements active at the playhead
    pub only_active: bool,
    gesture: Option<(ElementId, CanvasGesture)>,
    /// Last known size of the scroll view
    viewport_size: egui::Vec2,
}

impl CanvasPanel {
    /// Create a canvas panel at the given zoom
    pub fn new(zoom: f32) -> Self {
        Self {
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            only_active: false,
            gesture: None,
            viewport_size: egui::vec2(800.0, 600.0),
        }
    }

    /// Render the canvas panel
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut DashboardState,
        media: &MediaCache,
        playhead: Milliseconds,
        username: &str,
    ) {
        // Undo or another panel may have closed our gesture
        if let Some((id, _)) = self.gesture {
            if state.gesture_target() != Some(id) {
                self.gesture = None;
            }
        }

        ui.horizontal(|ui| {
            self.toolbar(ui, state, playhead);
        });
        ui.separator();

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.canvas(ui, state, media, playhead, username);
            });
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, state: &mut DashboardState, playhead: Milliseconds) {
        ui.menu_button("\u{2795} Add", |ui| {
            for element_type in ElementType::all() {
                if ui
                    .button(format!("{} {}", element_type.icon(), element_type.name()))
                    .clicked()
                {
                    match state.add_element(*element_type) {
                        Ok(id) => tracing::info!("Added {} element {}", element_type.name(), id),
                        Err(e) => tracing::error!("Failed to add element: {}", e),
                    }
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        ui.label("Zoom");
        ui.add(
            egui::Slider::new(&mut self.zoom, MIN_ZOOM..=MAX_ZOOM)
                .custom_formatter(|v, _| format!("{:.0}%", v * 100.0))
                .show_value(true),
        );
        if ui.button("Fit").on_hover_text("Fit the canvas in the panel").clicked() {
            self.zoom = fit_zoom(
                self.viewport_size.x,
                self.viewport_size.y,
                state.alert.canvas_width.0,
                state.alert.canvas_height.0,
            );
        }
        if ui.button("1:1").clicked() {
            self.zoom = 1.0;
        }

        ui.separator();
        ui.checkbox(&mut self.only_active, "Only active")
            .on_hover_text("Hide elements that are not on screen at the playhead");
        ui.weak(playhead.display());
    }

    fn canvas(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut DashboardState,
        media: &MediaCache,
        playhead: Milliseconds,
        username: &str,
    ) {
        self.viewport_size = ui.available_size();
        let zoom = self.zoom;
        let size = egui::vec2(state.alert.canvas_width.0 * zoom, state.alert.canvas_height.0 * zoom);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        let view = CanvasView {
            origin: response.rect.min,
            zoom,
        };

        painter.rect_filled(response.rect, 0.0, egui::Color32::from_rgb(24, 24, 28));
        draw_grid(&painter, response.rect, zoom);

        for element in state.alert.elements().filter(|e| e.has_area()) {
            let active = element.is_visible_at(playhead);
            if self.only_active && !active {
                continue;
            }
            let mut element_painter = painter.with_clip_rect(view.to_screen(element).intersect(response.rect));
            if !active {
                element_painter.set_opacity(HIDDEN_OPACITY);
            }
            draw_element(&element_painter, view, element, media, username);
        }

        painter.rect_stroke(response.rect, 0.0, egui::Stroke::new(1.0, egui::Color32::from_gray(70)));

        self.handle_input(ui, &response, view, state, playhead);

        let hovered = response
            .hover_pos()
            .and_then(|pos| self.pick(state, view, pos, playhead))
            .map(|(id, _)| id);
        if let Some(element) = hovered
            .filter(|id| Some(*id) != state.selected)
            .and_then(|id| state.alert.element(id))
        {
            painter.rect_stroke(
                view.to_screen(element),
                0.0,
                egui::Stroke::new(1.0, SELECTION_COLOR.gamma_multiply(0.5)),
            );
        }
        if let Some(element) = state.selected_element().filter(|e| e.has_area()) {
            draw_selection(&painter, view.to_screen(element), element.locked);
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        view: CanvasView,
        state: &mut DashboardState,
        playhead: Milliseconds,
    ) {
        if self.gesture.is_some() && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            state.cancel_gesture();
            self.gesture = None;
            tracing::debug!("Canvas gesture cancelled");
            return;
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let picked = response
                .interact_pointer_pos()
                .and_then(|pos| self.pick(state, view, pos, playhead));
            state.select(picked.map(|(id, _)| id));
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            let press = ui.input(|i| i.pointer.press_origin());
            if let Some((id, zone)) = press.and_then(|pos| self.pick(state, view, pos, playhead)) {
                state.select(Some(id));
                self.begin(state, id, zone);
                // Travel made before the drag threshold was crossed
                if let (Some(start), Some(now)) = (press, response.interact_pointer_pos()) {
                    let offset = now - start;
                    self.follow(state, offset, ui.input(|i| i.modifiers.shift));
                }
            }
        } else if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            if delta != egui::Vec2::ZERO {
                self.follow(state, delta, ui.input(|i| i.modifiers.shift));
            }
        }

        if response.drag_stopped() {
            if let Some((_, gesture)) = self.gesture.take() {
                let description = if gesture.is_drag() { "Move element" } else { "Resize element" };
                state.end_gesture(description);
            }
        }

        let cursor = match &self.gesture {
            Some((_, gesture)) if gesture.is_drag() => Some(egui::CursorIcon::Grabbing),
            Some((_, gesture)) => Some(resize_cursor(gesture.edges())),
            None => response
                .hover_pos()
                .and_then(|pos| self.pick(state, view, pos, playhead))
                .and_then(|(id, zone)| {
                    let locked = state.alert.element(id).is_some_and(|e| e.locked);
                    match zone {
                        HitZone::Outside => None,
                        _ if locked => Some(egui::CursorIcon::NotAllowed),
                        HitZone::Body => Some(egui::CursorIcon::Grab),
                        HitZone::Edge(edges) => Some(resize_cursor(edges)),
                    }
                }),
        };
        if let Some(cursor) = cursor {
            ui.ctx().set_cursor_icon(cursor);
        }
    }

    fn begin(&mut self, state: &mut DashboardState, id: ElementId, zone: HitZone) {
        let Some(element) = state.alert.element(id) else {
            return;
        };
        if element.locked {
            tracing::debug!("Element {} is locked", id);
            return;
        }
        let gesture = match zone {
            HitZone::Body => CanvasGesture::drag(element.rect(), self.zoom),
            HitZone::Edge(edges) => CanvasGesture::resize(element.rect(), edges, self.zoom),
            HitZone::Outside => return,
        };
        state.begin_gesture(id);
        self.gesture = Some((id, gesture));
    }

    fn follow(&mut self, state: &mut DashboardState, delta: egui::Vec2, keep_ratio: bool) {
        let Some((id, gesture)) = self.gesture.as_mut() else {
            return;
        };
        let id = *id;
        let placement = gesture.update(delta.x, delta.y, keep_ratio);

        let mut edits = vec![AlertEdit::Move {
            id,
            x: placement.x,
            y: placement.y,
        }];
        if !gesture.is_drag() {
            edits.push(AlertEdit::Resize {
                id,
                width: placement.width,
                height: placement.height,
            });
        }
        for edit in edits {
            if let Err(e) = state.preview_edit(edit) {
                tracing::warn!("Canvas edit rejected: {}", e);
            }
        }
    }

    /// Topmost element under `pos`, preferring the selected element's handles
    fn pick(
        &self,
        state: &DashboardState,
        view: CanvasView,
        pos: egui::Pos2,
        playhead: Milliseconds,
    ) -> Option<(ElementId, HitZone)> {
        let (x, y) = view.to_canvas(pos);
        let handle = HANDLE_SIZE / view.zoom;
        let pickable = |element: &&AlertElement| {
            element.has_area() && (!self.only_active || element.is_visible_at(playhead))
        };

        if let Some(selected) = state.selected_element().filter(pickable) {
            if let zone @ HitZone::Edge(_) = hit_test(selected.rect(), x, y, handle) {
                return Some((selected.id, zone));
            }
        }

        let elements: Vec<&AlertElement> = state.alert.elements().filter(pickable).collect();
        elements.into_iter().rev().find_map(|element| {
            match hit_test(element.rect(), x, y, handle) {
                HitZone::Outside => None,
                zone => Some((element.id, zone)),
            }
        })
    }
}

impl Default for CanvasPanel {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Mapping between canvas pixels and screen points
#[derive(Debug, Clone, Copy)]
struct CanvasView {
    origin: egui::Pos2,
    zoom: f32,
}

impl CanvasView {
    fn to_canvas(self, pos: egui::Pos2) -> (f32, f32) {
        ((pos.x - self.origin.x) / self.zoom, (pos.y - self.origin.y) / self.zoom)
    }

    fn to_screen(self, element: &AlertElement) -> egui::Rect {
        egui::Rect::from_min_size(
            self.origin + egui::vec2(element.pos_x.0 * self.zoom, element.pos_y.0 * self.zoom),
            egui::vec2(element.width.0 * self.zoom, element.height.0 * self.zoom),
        )
    }
}

/// Largest zoom that shows the whole canvas in `width` x `height` points
fn fit_zoom(width: f32, height: f32, canvas_width: f32, canvas_height: f32) -> f32 {
    if canvas_width <= 0.0 || canvas_height <= 0.0 {
        return 1.0;
    }
    (width / canvas_width).min(height / canvas_height).clamp(MIN_ZOOM, MAX_ZOOM)
}

fn resize_cursor(edges: ResizeEdges) -> egui::CursorIcon {
    match (edges.horizontal(), edges.vertical()) {
        (true, true) if (edges.left && edges.top) || (edges.right && edges.bottom) => {
            egui::CursorIcon::ResizeNwSe
        }
        (true, true) => egui::CursorIcon::ResizeNeSw,
        (true, false) => egui::CursorIcon::ResizeHorizontal,
        (false, true) => egui::CursorIcon::ResizeVertical,
        (false, false) => egui::CursorIcon::Default,
    }
}

/// Fill `{username}` placeholders for the preview
fn preview_text(content: &str, username: &str) -> String {
    content.replace("{username}", username)
}

fn draw_grid(painter: &egui::Painter, rect: egui::Rect, zoom: f32) {
    let spacing = 100.0 * zoom;
    if spacing < 8.0 {
        return;
    }
    let stroke = egui::Stroke::new(1.0, egui::Color32::from_gray(36));

    let mut x = rect.left() + spacing;
    while x < rect.right() {
        painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], stroke);
        x += spacing;
    }
    let mut y = rect.top() + spacing;
    while y < rect.bottom() {
        painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], stroke);
        y += spacing;
    }
}

fn draw_element(
    painter: &egui::Painter,
    view: CanvasView,
    element: &AlertElement,
    media: &MediaCache,
    username: &str,
) {
    let rect = view.to_screen(element);
    match &element.settings {
        ElementSettings::Text(text) => draw_text(painter, rect, view.zoom, text, username),
        ElementSettings::Image(image) => {
            if image.url.trim().is_empty() {
                draw_placeholder(painter, rect, element, "No source");
                return;
            }
            match media.get(&image.url) {
                MediaState::Ready(texture) => {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    painter.image(texture.id(), rect, uv, egui::Color32::WHITE.gamma_multiply(image.opacity));
                }
                MediaState::Loading => draw_placeholder(painter, rect, element, "Loading..."),
                MediaState::Failed(reason) => draw_placeholder(painter, rect, element, &reason),
                MediaState::Unsupported => draw_placeholder(painter, rect, element, &image.url),
            }
        }
        ElementSettings::Video(video) => draw_placeholder(painter, rect, element, &video.url),
        ElementSettings::Lottie(lottie) => draw_placeholder(painter, rect, element, &lottie.url),
        ElementSettings::Audio(_) => {}
    }
}

fn draw_text(painter: &egui::Painter, rect: egui::Rect, zoom: f32, text: &TextSettings, username: &str) {
    let [r, g, b, a] = text.color;
    let color = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
    let font = egui::FontId::proportional((text.font_size * zoom).max(1.0));
    let galley = painter.layout(preview_text(&text.content, username), font, color, rect.width());
    painter.galley(rect.min, galley.clone(), color);
    if text.bold {
        painter.galley(rect.min + egui::vec2(0.6, 0.0), galley, color);
    }
}

/// Placeholder box for media the canvas does not render itself
fn draw_placeholder(painter: &egui::Painter, rect: egui::Rect, element: &AlertElement, detail: &str) {
    let [r, g, b] = element.effective_color();
    let tint = egui::Color32::from_rgb(r, g, b);
    painter.rect_filled(rect, 2.0, tint.gamma_multiply(0.15));
    painter.rect_stroke(rect, 2.0, egui::Stroke::new(1.0, tint.gamma_multiply(0.6)));

    let label = format!("{} {}", element.element_type().icon(), element.title);
    painter.text(
        rect.center() - egui::vec2(0.0, 8.0),
        egui::Align2::CENTER_CENTER,
        label,
        egui::FontId::proportional(14.0),
        egui::Color32::from_gray(220),
    );
    if !detail.is_empty() {
        painter.text(
            rect.center() + egui::vec2(0.0, 10.0),
            egui::Align2::CENTER_CENTER,
            detail,
            egui::FontId::proportional(11.0),
            egui::Color32::from_gray(150),
        );
    }
}

fn draw_selection(painter: &egui::Painter, rect: egui::Rect, locked: bool) {
    painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.5, SELECTION_COLOR));
    if locked {
        painter.text(
            rect.right_top() + egui::vec2(-4.0, 4.0),
            egui::Align2::RIGHT_TOP,
            "\u{1f512}",
            egui::FontId::proportional(12.0),
            SELECTION_COLOR,
        );
        return;
    }

    let handles = [
        rect.left_top(),
        rect.center_top(),
        rect.right_top(),
        rect.left_center(),
        rect.right_center(),
        rect.left_bottom(),
        rect.center_bottom(),
        rect.right_bottom(),
    ];
    for center in handles {
        let handle = egui::Rect::from_center_size(center, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
        painter.rect_filled(handle, 1.0, egui::Color32::WHITE);
        painter.rect_stroke(handle, 1.0, egui::Stroke::new(1.0, SELECTION_COLOR));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streali_alert::Pixels;

    #[test]
    fn test_view_round_trips_points() {
        let view = CanvasView {
            origin: egui::pos2(100.0, 50.0),
            zoom: 0.5,
        };
        let element = AlertElement::new(ElementType::Image).with_position(200.0, 100.0);
        let rect = view.to_screen(&element);
        assert_eq!(rect.min, egui::pos2(200.0, 100.0));
        assert_eq!(view.to_canvas(rect.min), (200.0, 100.0));
        assert_eq!(rect.width(), element.width.0 * 0.5);
    }

    #[test]
    fn test_fit_zoom_uses_tighter_axis() {
        assert_eq!(fit_zoom(540.0, 1080.0, 1080.0, 1080.0), 0.5);
        assert_eq!(fit_zoom(10_000.0, 10_000.0, 1080.0, 1080.0), MAX_ZOOM);
        assert_eq!(fit_zoom(10.0, 10.0, 1080.0, 1080.0), MIN_ZOOM);
        assert_eq!(fit_zoom(500.0, 500.0, 0.0, 1080.0), 1.0);
    }

    #[test]
    fn test_pick_prefers_topmost_element() {
        let mut state = DashboardState::new();
        let below = state.alert.add_element(AlertElement::new(ElementType::Image).with_position(0.0, 0.0));
        let above = state.alert.add_element(AlertElement::new(ElementType::Image).with_position(100.0, 100.0));
        state.alert.add_element(AlertElement::new(ElementType::Audio));

        let panel = CanvasPanel::new(1.0);
        let view = CanvasView {
            origin: egui::Pos2::ZERO,
            zoom: 1.0,
        };
        let picked = panel.pick(&state, view, egui::pos2(150.0, 150.0), Milliseconds::ZERO);
        assert_eq!(picked, Some((above, HitZone::Body)));

        let picked = panel.pick(&state, view, egui::pos2(50.0, 50.0), Milliseconds::ZERO);
        assert_eq!(picked, Some((below, HitZone::Body)));

        assert_eq!(panel.pick(&state, view, egui::pos2(900.0, 900.0), Milliseconds::ZERO), None);
    }

    #[test]
    fn test_pick_skips_inactive_elements_when_filtered() {
        let mut state = DashboardState::new();
        let late = AlertElement::new(ElementType::Image).with_window(Milliseconds(5000.0), Milliseconds(1000.0));
        state.alert.add_element(late);

        let mut panel = CanvasPanel::new(1.0);
        let view = CanvasView {
            origin: egui::Pos2::ZERO,
            zoom: 1.0,
        };
        assert!(panel.pick(&state, view, egui::pos2(50.0, 50.0), Milliseconds::ZERO).is_some());
        panel.only_active = true;
        assert!(panel.pick(&state, view, egui::pos2(50.0, 50.0), Milliseconds::ZERO).is_none());
    }

    #[test]
    fn test_drag_previews_and_commits_once() {
        let mut state = DashboardState::new();
        let id = state.alert.add_element(AlertElement::new(ElementType::Image).with_position(10.0, 10.0));

        let mut panel = CanvasPanel::new(0.5);
        panel.begin(&mut state, id, HitZone::Body);
        panel.follow(&mut state, egui::vec2(10.0, 0.0), false);
        panel.follow(&mut state, egui::vec2(10.0, 20.0), false);

        let element = state.alert.element(id).unwrap();
        assert_eq!(element.pos_x, Pixels(50.0));
        assert_eq!(element.pos_y, Pixels(50.0));

        state.end_gesture("Move element");
        assert_eq!(state.history.undo_len(), 1);
    }

    #[test]
    fn test_locked_elements_do_not_start_gestures() {
        let mut state = DashboardState::new();
        let mut element = AlertElement::new(ElementType::Image);
        element.locked = true;
        let id = state.alert.add_element(element);

        let mut panel = CanvasPanel::new(1.0);
        panel.begin(&mut state, id, HitZone::Body);
        assert!(panel.gesture.is_none());
        assert!(!state.in_gesture());
    }

    #[test]
    fn test_username_placeholder() {
        assert_eq!(preview_text("{username} just followed!", "lea"), "lea just followed!");
        assert_eq!(preview_text("Thanks!", "lea"), "Thanks!");
    }

    #[test]
    fn test_corner_cursors() {
        let nw = ResizeEdges { left: true, top: true, ..ResizeEdges::NONE };
        let ne = ResizeEdges { right: true, top: true, ..ResizeEdges::NONE };
        let e = ResizeEdges { right: true, ..ResizeEdges::NONE };
        assert_eq!(resize_cursor(nw), egui::CursorIcon::ResizeNwSe);
        assert_eq!(resize_cursor(ne), egui::CursorIcon::ResizeNeSw);
        assert_eq!(resize_cursor(e), egui::CursorIcon::ResizeHorizontal);
    }
}
