// SPDX-License-Identifier: MIT OR Apache-2.0
//! Alert elements: the timed, positioned widgets of an overlay.

use crate::units::{Milliseconds, Pixels};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Animation tag used when an element has no entrance or exit animation
pub const NO_ANIMATION: &str = "none";

/// Unique identifier for an alert element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    /// Create a new random element ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of alert element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Styled text
    Text,
    /// Still image
    Image,
    /// Video clip
    Video,
    /// Lottie animation
    Lottie,
    /// Sound only, no canvas presence
    Audio,
}

impl ElementType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Video => "Video",
            Self::Lottie => "Lottie",
            Self::Audio => "Audio",
        }
    }

    /// Glyph shown next to the element title on the timeline
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Image => "\u{1f5bc}", // framed picture
            Self::Video => "\u{1f39e}", // film frames
            Self::Text => "T",
            Self::Audio => "\u{266b}",  // beamed notes
            Self::Lottie => "\u{1f4d0}", // triangular ruler
        }
    }

    /// All element types in menu order
    pub fn all() -> &'static [ElementType] {
        &[
            ElementType::Text,
            ElementType::Image,
            ElementType::Video,
            ElementType::Lottie,
            ElementType::Audio,
        ]
    }

    /// Whether elements of this type occupy space on the canvas
    pub fn has_area(&self) -> bool {
        !matches!(self, Self::Audio)
    }

    /// Default canvas size for a freshly created element
    fn default_size(&self) -> (f32, f32) {
        match self {
            Self::Text => (400.0, 80.0),
            Self::Image | Self::Lottie => (300.0, 300.0),
            Self::Video => (480.0, 270.0),
            Self::Audio => (0.0, 0.0),
        }
    }
}

/// Settings for a text element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSettings {
    /// Text content; `{username}`-style placeholders are filled at display time
    pub content: String,
    /// Font size in pixels
    pub font_size: f32,
    /// Color as RGBA
    pub color: [u8; 4],
    /// Bold weight
    pub bold: bool,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            content: "{username} just followed!".to_string(),
            font_size: 32.0,
            color: [255, 255, 255, 255],
            bold: true,
        }
    }
}

/// Settings for an image element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    /// Image URL or local path
    pub url: String,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            opacity: 1.0,
        }
    }
}

/// Settings for a video element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Video URL or local path
    pub url: String,
    /// Volume in `[0, 1]`
    pub volume: f32,
    /// Whether the sound track is muted
    pub muted: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            volume: 1.0,
            muted: false,
        }
    }
}

/// Settings for a lottie element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LottieSettings {
    /// URL of the lottie JSON
    pub url: String,
    /// Restart the animation when it ends
    pub looping: bool,
}

impl Default for LottieSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            looping: false,
        }
    }
}

/// Settings for an audio element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Audio URL or local path
    pub url: String,
    /// Volume in `[0, 1]`
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            volume: 0.8,
        }
    }
}

/// Per-type element settings. The variant determines the element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementSettings {
    /// Text settings
    Text(TextSettings),
    /// Image settings
    Image(ImageSettings),
    /// Video settings
    Video(VideoSettings),
    /// Lottie settings
    Lottie(LottieSettings),
    /// Audio settings
    Audio(AudioSettings),
}

impl ElementSettings {
    /// Default settings for an element type
    pub fn for_type(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Text => Self::Text(TextSettings::default()),
            ElementType::Image => Self::Image(ImageSettings::default()),
            ElementType::Video => Self::Video(VideoSettings::default()),
            ElementType::Lottie => Self::Lottie(LottieSettings::default()),
            ElementType::Audio => Self::Audio(AudioSettings::default()),
        }
    }

    /// The element type these settings belong to
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Image(_) => ElementType::Image,
            Self::Video(_) => ElementType::Video,
            Self::Lottie(_) => ElementType::Lottie,
            Self::Audio(_) => ElementType::Audio,
        }
    }

    /// Media source, if the element type has one
    pub fn source_url(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Image(s) => Some(&s.url),
            Self::Video(s) => Some(&s.url),
            Self::Lottie(s) => Some(&s.url),
            Self::Audio(s) => Some(&s.url),
        }
    }
}

/// Axis-aligned element bounds in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementRect {
    /// Left edge
    pub x: Pixels,
    /// Top edge
    pub y: Pixels,
    /// Width
    pub width: Pixels,
    /// Height
    pub height: Pixels,
}

impl ElementRect {
    /// Whether a canvas point lies inside the rect
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x.0 && x <= self.x.0 + self.width.0 && y >= self.y.0 && y <= self.y.0 + self.height.0
    }

    /// Width over height; 1.0 for degenerate rects
    pub fn aspect_ratio(&self) -> f32 {
        if self.height.0 <= f32::EPSILON {
            1.0
        } else {
            self.width.0 / self.height.0
        }
    }
}

/// A timed, positioned overlay widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertElement {
    /// Unique element ID
    pub id: ElementId,
    /// Title shown on the timeline
    pub title: String,
    /// Type and per-type settings
    pub settings: ElementSettings,
    /// Left edge on the canvas
    #[serde(rename = "posX")]
    pub pos_x: Pixels,
    /// Top edge on the canvas
    #[serde(rename = "posY")]
    pub pos_y: Pixels,
    /// Width on the canvas
    pub width: Pixels,
    /// Height on the canvas
    pub height: Pixels,
    /// Entrance animation tag
    #[serde(default)]
    pub animation_in: Option<String>,
    /// Exit animation tag
    #[serde(default)]
    pub animation_out: Option<String>,
    /// When the element appears, relative to alert start
    pub start_time: Milliseconds,
    /// How long the element stays on screen
    pub duration: Milliseconds,
    /// Locked elements are neither draggable nor resizable
    #[serde(default)]
    pub locked: bool,
    /// Timeline bar color override as RGB
    #[serde(default)]
    pub color: Option<[u8; 3]>,
}

impl AlertElement {
    /// Create an element of the given type with default settings
    pub fn new(element_type: ElementType) -> Self {
        let (width, height) = element_type.default_size();
        Self {
            id: ElementId::new(),
            title: element_type.name().to_string(),
            settings: ElementSettings::for_type(element_type),
            pos_x: Pixels::ZERO,
            pos_y: Pixels::ZERO,
            width: Pixels(width),
            height: Pixels(height),
            animation_in: None,
            animation_out: None,
            start_time: Milliseconds::ZERO,
            duration: Milliseconds(3000.0),
            locked: false,
            color: None,
        }
    }

    /// Builder: set position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.pos_x = Pixels(x);
        self.pos_y = Pixels(y);
        self
    }

    /// Builder: set size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Pixels(width);
        self.height = Pixels(height);
        self
    }

    /// Builder: set active window
    pub fn with_window(mut self, start_time: Milliseconds, duration: Milliseconds) -> Self {
        self.start_time = start_time;
        self.duration = duration;
        self
    }

    /// Builder: set title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The element type
    pub fn element_type(&self) -> ElementType {
        self.settings.element_type()
    }

    /// Whether this element is drawn on the canvas
    pub fn has_area(&self) -> bool {
        self.element_type().has_area()
    }

    /// End of the active window
    pub fn end_time(&self) -> Milliseconds {
        self.start_time + self.duration
    }

    /// Whether the element is on screen at `timestamp` (both ends inclusive)
    pub fn is_visible_at(&self, timestamp: Milliseconds) -> bool {
        timestamp >= self.start_time && timestamp <= self.end_time()
    }

    /// Canvas bounds
    pub fn rect(&self) -> ElementRect {
        ElementRect {
            x: self.pos_x,
            y: self.pos_y,
            width: self.width,
            height: self.height,
        }
    }

    /// Entrance animation tag, `"none"` when unset
    pub fn entrance_animation(&self) -> &str {
        self.animation_in.as_deref().unwrap_or(NO_ANIMATION)
    }

    /// Exit animation tag, `"none"` when unset
    pub fn exit_animation(&self) -> &str {
        self.animation_out.as_deref().unwrap_or(NO_ANIMATION)
    }

    /// Timeline bar color
    pub fn effective_color(&self) -> [u8; 3] {
        self.color.unwrap_or([255, 0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_window_is_inclusive() {
        let element = AlertElement::new(ElementType::Image)
            .with_window(Milliseconds(1000.0), Milliseconds(2000.0));

        assert!(!element.is_visible_at(Milliseconds(999.0)));
        assert!(element.is_visible_at(Milliseconds(1000.0)));
        assert!(element.is_visible_at(Milliseconds(3000.0)));
        assert!(!element.is_visible_at(Milliseconds(3001.0)));
    }

    #[test]
    fn test_animation_tags_default_to_none() {
        let mut element = AlertElement::new(ElementType::Text);
        assert_eq!(element.entrance_animation(), "none");
        assert_eq!(element.exit_animation(), "none");

        element.animation_in = Some("fadeIn".to_string());
        assert_eq!(element.entrance_animation(), "fadeIn");
    }

    #[test]
    fn test_audio_has_no_area() {
        assert!(!AlertElement::new(ElementType::Audio).has_area());
        assert!(AlertElement::new(ElementType::Video).has_area());
    }

    #[test]
    fn test_settings_carry_the_type_tag() {
        let element = AlertElement::new(ElementType::Lottie);
        let ron_str = ron::to_string(&element).unwrap();
        assert!(ron_str.contains("Lottie("));

        let loaded: AlertElement = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded.element_type(), ElementType::Lottie);
        assert_eq!(loaded, element);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let element = AlertElement::new(ElementType::Text);
        let ron_str = ron::to_string(&element).unwrap().replace("Text(", "Hologram(");
        assert!(ron::from_str::<AlertElement>(&ron_str).is_err());
    }
}
