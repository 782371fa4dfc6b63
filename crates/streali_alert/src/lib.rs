// SPDX-License-Identifier: MIT OR Apache-2.0
//! Alert document model for the Streali dashboard.
//!
//! An alert is a fixed-size canvas with a total running time. Each element
//! (text, image, video, lottie, audio) has a position, a size and an active
//! time window.
//!
//! ## Architecture
//!
//! Two views edit the same document:
//! - The canvas editor drags and resizes elements in space
//! - The timeline moves and stretches their windows in time
//!
//! Neither view mutates the other. Both emit [`AlertEdit`]s that are applied
//! to the single [`Alert`] and re-read it every frame.

pub mod units;
pub mod element;
pub mod alert;
pub mod edit;
pub mod canvas;
pub mod timeline;
pub mod playback;
pub mod ui;

pub use units::{Milliseconds, Pixels};
pub use element::{
    AlertElement, ElementId, ElementType, ElementRect, ElementSettings,
    TextSettings, ImageSettings, VideoSettings, LottieSettings, AudioSettings,
    NO_ANIMATION,
};
pub use alert::{Alert, AlertId, AlertError, AlertResult, DEFAULT_CANVAS_SIZE, DEFAULT_TOTAL_TIME};
pub use edit::{AlertEdit, MIN_DURATION};
pub use canvas::{hit_test, CanvasGesture, HitZone, Placement, ResizeEdges, MIN_ELEMENT_SIZE};
pub use timeline::{
    TimeScale, TimelineEntry, TimelineStrip, StripGesture, StripCommit,
    DEFAULT_PIXELS_PER_SECOND, MIN_BAR_WIDTH, BAR_HEIGHT,
};
pub use playback::{Playback, PlaybackState};
pub use ui::{TimelineState, TimelineResponse, DragOperation, commit_to_edit};
