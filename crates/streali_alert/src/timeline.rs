// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline model: pixel/time conversion and the per-element strip.
//!
//! Each element is drawn as a bar inside a container whose width stands for
//! the alert's total time. Bars move along the x axis to change the start
//! time and grow from their right handle to change the duration. Both
//! gestures preview in pixels and commit a time only on release.

use crate::element::{AlertElement, ElementId, ElementType};
use crate::units::{Milliseconds, Pixels};
use serde::{Deserialize, Serialize};

/// Default horizontal scale
pub const DEFAULT_PIXELS_PER_SECOND: f32 = 100.0;

/// Narrowest a bar may be resized to
pub const MIN_BAR_WIDTH: Pixels = Pixels(100.0);

/// Bar height
pub const BAR_HEIGHT: Pixels = Pixels(40.0);

/// Linear mapping between alert time and timeline pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    /// Pixels drawn per second of alert time
    pub pixels_per_second: f32,
}

impl TimeScale {
    /// Create a scale; non-positive values fall back to the default
    pub fn new(pixels_per_second: f32) -> Self {
        if pixels_per_second > 0.0 && pixels_per_second.is_finite() {
            Self { pixels_per_second }
        } else {
            Self::default()
        }
    }

    /// Convert a time to a pixel offset
    pub fn time_to_pixel(&self, time: Milliseconds) -> Pixels {
        Pixels(time.0 / 1000.0 * self.pixels_per_second)
    }

    /// Convert a pixel offset to a time
    pub fn pixel_to_time(&self, pixels: Pixels) -> Milliseconds {
        Milliseconds(pixels.0 / self.pixels_per_second * 1000.0)
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self {
            pixels_per_second: DEFAULT_PIXELS_PER_SECOND,
        }
    }
}

/// One element's row on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    /// Element the row belongs to
    pub id: ElementId,
    /// Element type, selects the icon
    pub element_type: ElementType,
    /// Title drawn on the bar
    pub title: String,
    /// Start of the active window
    pub start_time: Milliseconds,
    /// Length of the active window
    pub duration: Milliseconds,
    /// Bar color as RGB
    pub color: [u8; 3],
}

impl TimelineEntry {
    /// Build the row for an element
    pub fn from_element(element: &AlertElement) -> Self {
        Self {
            id: element.id,
            element_type: element.element_type(),
            title: element.title.clone(),
            start_time: element.start_time,
            duration: element.duration,
            color: element.effective_color(),
        }
    }
}

/// Gesture currently applied to a strip
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StripGesture {
    /// Not interacting
    #[default]
    Idle,
    /// Dragging the whole bar
    Moving {
        /// Bar offset when the drag started
        origin_left: Pixels,
        /// Accumulated pointer travel
        travel: Pixels,
    },
    /// Dragging the right handle
    Resizing {
        /// Bar width when the resize started
        origin_width: Pixels,
        /// Accumulated pointer travel
        travel: Pixels,
    },
}

/// Value committed when a gesture ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StripCommit {
    /// New start time after a move
    Moved(Milliseconds),
    /// New duration after a resize
    Resized(Milliseconds),
}

/// Pixel state of a single bar plus its in-flight gesture
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineStrip {
    /// Bar offset from the container's left edge
    pub left: Pixels,
    /// Bar width
    pub width: Pixels,
    /// Container width (the alert's total time)
    pub container: Pixels,
    gesture: StripGesture,
    scale: TimeScale,
}

impl TimelineStrip {
    /// Lay out an entry inside a container spanning `total_time`
    pub fn new(entry: &TimelineEntry, total_time: Milliseconds, scale: TimeScale) -> Self {
        let container = scale.time_to_pixel(total_time);
        Self {
            left: scale.time_to_pixel(entry.start_time),
            width: scale.time_to_pixel(entry.duration),
            container,
            gesture: StripGesture::Idle,
            scale,
        }
    }

    /// Scale the strip was laid out with
    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// Current gesture
    pub fn gesture(&self) -> StripGesture {
        self.gesture
    }

    /// Whether a gesture is in progress
    pub fn is_active(&self) -> bool {
        !matches!(self.gesture, StripGesture::Idle)
    }

    /// Largest offset that keeps the bar inside the container
    fn max_left(&self) -> Pixels {
        (self.container - self.width).max(Pixels::ZERO)
    }

    /// Widest the bar may grow from its current offset
    fn max_width(&self) -> Pixels {
        (self.container - self.left).max(Pixels::ZERO)
    }

    /// Narrowest the bar may shrink to. The container edge wins over
    /// `MIN_BAR_WIDTH` for bars starting close to the end.
    fn min_width(&self) -> Pixels {
        MIN_BAR_WIDTH.min(self.max_width())
    }

    /// Start dragging the bar. Ignored while resizing.
    pub fn begin_move(&mut self) {
        if matches!(self.gesture, StripGesture::Idle) {
            self.gesture = StripGesture::Moving {
                origin_left: self.left,
                travel: Pixels::ZERO,
            };
        }
    }

    /// Start dragging the handle. Ignored while moving.
    pub fn begin_resize(&mut self) {
        if matches!(self.gesture, StripGesture::Idle) {
            self.gesture = StripGesture::Resizing {
                origin_width: self.width,
                travel: Pixels::ZERO,
            };
        }
    }

    /// Apply pointer travel along the x axis
    pub fn drag_by(&mut self, delta_x: Pixels) {
        match &mut self.gesture {
            StripGesture::Idle => {}
            StripGesture::Moving { origin_left, travel } => {
                *travel = *travel + delta_x;
                let target = *origin_left + *travel;
                self.left = target.clamp(Pixels::ZERO, self.max_left());
            }
            StripGesture::Resizing { origin_width, travel } => {
                *travel = *travel + delta_x;
                let target = *origin_width + *travel;
                self.width = target.clamp(self.min_width(), self.max_width());
            }
        }
    }

    /// Finish the gesture and report the time it commits
    pub fn end(&mut self) -> Option<StripCommit> {
        let commit = match self.gesture {
            StripGesture::Idle => None,
            StripGesture::Moving { .. } => Some(StripCommit::Moved(self.scale.pixel_to_time(self.left))),
            StripGesture::Resizing { .. } => Some(StripCommit::Resized(self.scale.pixel_to_time(self.width))),
        };
        self.gesture = StripGesture::Idle;
        commit
    }

    /// Abandon the gesture and restore the bar
    pub fn cancel(&mut self) {
        match self.gesture {
            StripGesture::Idle => {}
            StripGesture::Moving { origin_left, .. } => self.left = origin_left,
            StripGesture::Resizing { origin_width, .. } => self.width = origin_width,
        }
        self.gesture = StripGesture::Idle;
    }

    /// Re-read times from the document unless a gesture is in progress
    pub fn sync(&mut self, entry: &TimelineEntry, total_time: Milliseconds) {
        if self.is_active() {
            return;
        }
        self.container = self.scale.time_to_pixel(total_time);
        self.left = self.scale.time_to_pixel(entry.start_time);
        self.width = self.scale.time_to_pixel(entry.duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: f32, duration: f32) -> TimelineEntry {
        let element = AlertElement::new(ElementType::Image)
            .with_window(Milliseconds(start), Milliseconds(duration));
        TimelineEntry::from_element(&element)
    }

    #[test]
    fn test_conversion_round_trips() {
        let scale = TimeScale::default();
        assert_eq!(scale.time_to_pixel(Milliseconds(2500.0)), Pixels(250.0));
        assert_eq!(scale.pixel_to_time(Pixels(250.0)), Milliseconds(2500.0));
    }

    #[test]
    fn test_invalid_scale_falls_back_to_default() {
        assert_eq!(TimeScale::new(0.0), TimeScale::default());
        assert_eq!(TimeScale::new(f32::NAN), TimeScale::default());
        assert_eq!(TimeScale::new(50.0).pixels_per_second, 50.0);
    }

    #[test]
    fn test_strip_layout_is_proportional() {
        let strip = TimelineStrip::new(&entry(1000.0, 3000.0), Milliseconds(10_000.0), TimeScale::default());
        assert_eq!(strip.left, Pixels(100.0));
        assert_eq!(strip.width, Pixels(300.0));
        assert_eq!(strip.container, Pixels(1000.0));
    }

    #[test]
    fn test_move_is_bounded_by_container() {
        let mut strip = TimelineStrip::new(&entry(1000.0, 3000.0), Milliseconds(10_000.0), TimeScale::default());

        strip.begin_move();
        strip.drag_by(Pixels(-500.0));
        assert_eq!(strip.left, Pixels::ZERO);

        strip.drag_by(Pixels(2000.0));
        assert_eq!(strip.left, Pixels(700.0));

        assert_eq!(strip.end(), Some(StripCommit::Moved(Milliseconds(7000.0))));
        assert!(!strip.is_active());
    }

    #[test]
    fn test_resize_respects_min_and_container() {
        let mut strip = TimelineStrip::new(&entry(2000.0, 3000.0), Milliseconds(10_000.0), TimeScale::default());

        strip.begin_resize();
        strip.drag_by(Pixels(-280.0));
        assert_eq!(strip.width, MIN_BAR_WIDTH);

        strip.drag_by(Pixels(5000.0));
        assert_eq!(strip.width, Pixels(800.0));

        assert_eq!(strip.end(), Some(StripCommit::Resized(Milliseconds(8000.0))));
    }

    #[test]
    fn test_resize_near_container_end_stays_inside() {
        let mut strip = TimelineStrip::new(&entry(9950.0, 3000.0), Milliseconds(10_000.0), TimeScale::default());

        strip.begin_resize();
        strip.drag_by(Pixels(-1000.0));
        assert!((strip.width.0 - 5.0).abs() < 1e-3);
        assert!(strip.left.0 + strip.width.0 <= strip.container.0 + 1e-3);

        strip.drag_by(Pixels(2000.0));
        assert!(strip.left.0 + strip.width.0 <= strip.container.0 + 1e-3);

        match strip.end() {
            Some(StripCommit::Resized(ms)) => assert!((ms.0 - 50.0).abs() < 0.1),
            other => panic!("unexpected commit {other:?}"),
        }
    }

    #[test]
    fn test_gestures_are_exclusive() {
        let mut strip = TimelineStrip::new(&entry(0.0, 2000.0), Milliseconds(10_000.0), TimeScale::default());

        strip.begin_resize();
        strip.begin_move();
        strip.drag_by(Pixels(50.0));

        assert_eq!(strip.left, Pixels::ZERO);
        assert_eq!(strip.width, Pixels(250.0));
    }

    #[test]
    fn test_cancel_restores_and_sync_waits_for_gesture() {
        let mut strip = TimelineStrip::new(&entry(0.0, 2000.0), Milliseconds(10_000.0), TimeScale::default());

        strip.begin_move();
        strip.drag_by(Pixels(120.0));
        strip.sync(&entry(5000.0, 2000.0), Milliseconds(10_000.0));
        assert_eq!(strip.left, Pixels(120.0));

        strip.cancel();
        assert_eq!(strip.left, Pixels::ZERO);
        assert_eq!(strip.end(), None);

        strip.sync(&entry(5000.0, 2000.0), Milliseconds(10_000.0));
        assert_eq!(strip.left, Pixels(500.0));
    }
}
