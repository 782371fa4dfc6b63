// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas drag and resize arithmetic.
//!
//! Pointer deltas arrive in screen points; the canvas is drawn at `zoom`
//! screen points per canvas pixel, so every delta is divided by the zoom
//! before it touches element geometry.

use crate::element::ElementRect;
use crate::units::Pixels;

/// Smallest width or height an element can be resized to
pub const MIN_ELEMENT_SIZE: Pixels = Pixels(10.0);

/// Which edges a resize gesture moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeEdges {
    /// Left edge
    pub left: bool,
    /// Right edge
    pub right: bool,
    /// Top edge
    pub top: bool,
    /// Bottom edge
    pub bottom: bool,
}

impl ResizeEdges {
    /// No edge
    pub const NONE: Self = Self { left: false, right: false, top: false, bottom: false };

    /// Whether no edge is selected
    pub fn is_none(&self) -> bool {
        !(self.left || self.right || self.top || self.bottom)
    }

    /// Whether a vertical (left/right) edge is involved
    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    /// Whether a horizontal (top/bottom) edge is involved
    pub fn vertical(&self) -> bool {
        self.top || self.bottom
    }
}

/// Where the pointer sits relative to an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    /// Outside the element
    Outside,
    /// Inside, away from edges: drag moves the element
    Body,
    /// Near one or two edges: drag resizes
    Edge(ResizeEdges),
}

/// Classify a canvas point against an element rect.
///
/// `handle` is the edge grab distance in canvas pixels. It shrinks to a
/// quarter of the size on small axes so the body stays draggable.
pub fn hit_test(rect: ElementRect, x: f32, y: f32, handle: f32) -> HitZone {
    let left = rect.x.0;
    let top = rect.y.0;
    let right = left + rect.width.0;
    let bottom = top + rect.height.0;

    if x < left - handle || x > right + handle || y < top - handle || y > bottom + handle {
        return HitZone::Outside;
    }

    let hx = handle.min(rect.width.0 / 4.0);
    let hy = handle.min(rect.height.0 / 4.0);
    let edges = ResizeEdges {
        left: (x - left).abs() <= hx,
        right: (x - right).abs() <= hx,
        top: (y - top).abs() <= hy,
        bottom: (y - bottom).abs() <= hy,
    };

    if edges.is_none() {
        if rect.contains(x, y) {
            HitZone::Body
        } else {
            HitZone::Outside
        }
    } else {
        HitZone::Edge(edges)
    }
}

/// Geometry produced by one gesture step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// New left edge
    pub x: Pixels,
    /// New top edge
    pub y: Pixels,
    /// New width
    pub width: Pixels,
    /// New height
    pub height: Pixels,
}

impl From<ElementRect> for Placement {
    fn from(rect: ElementRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// A pointer gesture on one element.
///
/// The gesture remembers the rect it started from and the accumulated
/// pointer travel, so rounding never drifts and clamping is reversible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGesture {
    origin: ElementRect,
    edges: ResizeEdges,
    travel_x: f32,
    travel_y: f32,
    zoom: f32,
}

impl CanvasGesture {
    /// Start moving an element
    pub fn drag(origin: ElementRect, zoom: f32) -> Self {
        Self::resize(origin, ResizeEdges::NONE, zoom)
    }

    /// Start resizing an element from the given edges
    pub fn resize(origin: ElementRect, edges: ResizeEdges, zoom: f32) -> Self {
        Self {
            origin,
            edges,
            travel_x: 0.0,
            travel_y: 0.0,
            zoom: if zoom > 0.0 { zoom } else { 1.0 },
        }
    }

    /// Whether this gesture moves rather than resizes
    pub fn is_drag(&self) -> bool {
        self.edges.is_none()
    }

    /// Edges being resized
    pub fn edges(&self) -> ResizeEdges {
        self.edges
    }

    /// Rect the gesture started from
    pub fn origin(&self) -> ElementRect {
        self.origin
    }

    /// Feed a screen-space pointer delta and return the new geometry.
    ///
    /// With `keep_ratio` the aspect ratio captured at the start of the
    /// gesture is preserved.
    pub fn update(&mut self, screen_dx: f32, screen_dy: f32, keep_ratio: bool) -> Placement {
        self.travel_x += screen_dx / self.zoom;
        self.travel_y += screen_dy / self.zoom;

        if self.is_drag() {
            return Placement {
                x: Pixels(self.origin.x.0 + self.travel_x),
                y: Pixels(self.origin.y.0 + self.travel_y),
                width: self.origin.width,
                height: self.origin.height,
            };
        }

        self.resized(keep_ratio)
    }

    fn resized(&self, keep_ratio: bool) -> Placement {
        let origin = self.origin;
        let min = MIN_ELEMENT_SIZE.0;

        let mut width = origin.width.0;
        let mut height = origin.height.0;

        if self.edges.right {
            width = origin.width.0 + self.travel_x;
        } else if self.edges.left {
            width = origin.width.0 - self.travel_x;
        }
        if self.edges.bottom {
            height = origin.height.0 + self.travel_y;
        } else if self.edges.top {
            height = origin.height.0 - self.travel_y;
        }

        width = width.max(min);
        height = height.max(min);

        if keep_ratio {
            let ratio = origin.aspect_ratio();
            if self.edges.horizontal() {
                height = width / ratio;
                if height < min {
                    height = min;
                    width = min * ratio;
                }
            } else if self.edges.vertical() {
                width = height * ratio;
                if width < min {
                    width = min;
                    height = min / ratio;
                }
            }
        }

        // Left and top edges move the origin by however much the size changed,
        // which keeps the opposite edge pinned even when clamped.
        let x = if self.edges.left {
            origin.x.0 + (origin.width.0 - width)
        } else {
            origin.x.0
        };
        let y = if self.edges.top {
            origin.y.0 + (origin.height.0 - height)
        } else {
            origin.y.0
        };

        Placement {
            x: Pixels(x),
            y: Pixels(y),
            width: Pixels(width),
            height: Pixels(height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> ElementRect {
        ElementRect {
            x: Pixels(x),
            y: Pixels(y),
            width: Pixels(w),
            height: Pixels(h),
        }
    }

    #[test]
    fn test_drag_divides_by_zoom() {
        let mut gesture = CanvasGesture::drag(rect(100.0, 50.0, 200.0, 100.0), 0.5);
        let placement = gesture.update(10.0, -20.0, false);

        assert_eq!(placement.x, Pixels(120.0));
        assert_eq!(placement.y, Pixels(10.0));
        assert_eq!(placement.width, Pixels(200.0));

        let placement = gesture.update(10.0, 0.0, false);
        assert_eq!(placement.x, Pixels(140.0));
    }

    #[test]
    fn test_resize_right_and_bottom_grow_size() {
        let mut gesture = CanvasGesture::resize(
            rect(0.0, 0.0, 200.0, 100.0),
            ResizeEdges { right: true, bottom: true, ..ResizeEdges::NONE },
            1.0,
        );
        let placement = gesture.update(30.0, 20.0, false);

        assert_eq!(placement, Placement {
            x: Pixels(0.0),
            y: Pixels(0.0),
            width: Pixels(230.0),
            height: Pixels(120.0),
        });
    }

    #[test]
    fn test_resize_left_moves_origin() {
        let mut gesture = CanvasGesture::resize(
            rect(100.0, 100.0, 200.0, 100.0),
            ResizeEdges { left: true, ..ResizeEdges::NONE },
            1.0,
        );
        let placement = gesture.update(50.0, 0.0, false);

        assert_eq!(placement.x, Pixels(150.0));
        assert_eq!(placement.width, Pixels(150.0));
    }

    #[test]
    fn test_resize_clamps_and_pins_opposite_edge() {
        let mut gesture = CanvasGesture::resize(
            rect(100.0, 100.0, 200.0, 100.0),
            ResizeEdges { top: true, ..ResizeEdges::NONE },
            1.0,
        );
        let placement = gesture.update(0.0, 500.0, false);

        assert_eq!(placement.height, MIN_ELEMENT_SIZE);
        assert_eq!(placement.y, Pixels(190.0));
    }

    #[test]
    fn test_keep_ratio_uses_ratio_at_gesture_start() {
        let mut gesture = CanvasGesture::resize(
            rect(0.0, 0.0, 200.0, 100.0),
            ResizeEdges { right: true, ..ResizeEdges::NONE },
            1.0,
        );
        let placement = gesture.update(100.0, 0.0, true);
        assert_eq!(placement.width, Pixels(300.0));
        assert_eq!(placement.height, Pixels(150.0));

        let placement = gesture.update(100.0, 0.0, true);
        assert_eq!(placement.width, Pixels(400.0));
        assert_eq!(placement.height, Pixels(200.0));
    }

    #[test]
    fn test_keep_ratio_from_vertical_edge() {
        let mut gesture = CanvasGesture::resize(
            rect(0.0, 0.0, 200.0, 100.0),
            ResizeEdges { bottom: true, ..ResizeEdges::NONE },
            2.0,
        );
        let placement = gesture.update(0.0, 100.0, true);

        assert_eq!(placement.height, Pixels(150.0));
        assert_eq!(placement.width, Pixels(300.0));
    }

    #[test]
    fn test_hit_test_zones() {
        let r = rect(100.0, 100.0, 200.0, 100.0);

        assert_eq!(hit_test(r, 50.0, 50.0, 6.0), HitZone::Outside);
        assert_eq!(hit_test(r, 200.0, 150.0, 6.0), HitZone::Body);
        assert_eq!(
            hit_test(r, 298.0, 150.0, 6.0),
            HitZone::Edge(ResizeEdges { right: true, ..ResizeEdges::NONE })
        );
        assert_eq!(
            hit_test(r, 101.0, 199.0, 6.0),
            HitZone::Edge(ResizeEdges { left: true, bottom: true, ..ResizeEdges::NONE })
        );
    }

    #[test]
    fn test_small_elements_keep_a_draggable_body() {
        let tiny = rect(100.0, 100.0, 10.0, 10.0);
        assert_eq!(hit_test(tiny, 105.0, 105.0, 12.0), HitZone::Body);
        assert_eq!(
            hit_test(tiny, 109.0, 105.0, 12.0),
            HitZone::Edge(ResizeEdges { right: true, ..ResizeEdges::NONE })
        );

        let banner = rect(0.0, 0.0, 300.0, 20.0);
        assert_eq!(hit_test(banner, 150.0, 10.0, 12.0), HitZone::Body);
        assert_eq!(
            hit_test(banner, 150.0, 1.0, 12.0),
            HitZone::Edge(ResizeEdges { top: true, ..ResizeEdges::NONE })
        );
        assert_eq!(hit_test(banner, 150.0, -10.0, 12.0), HitZone::Outside);
    }
}
