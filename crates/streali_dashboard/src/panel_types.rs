// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared panel type definitions.

/// Panel types that can be docked in the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    /// Alert canvas with drag/resize
    Canvas,
    /// Element timeline
    Timeline,
    /// Selected element properties
    Inspector,
    /// Live event feed and filter
    Events,
    /// Console/log output
    Console,
}

impl PanelType {
    /// All panels in menu order
    pub const ALL: [PanelType; 5] = [
        Self::Canvas,
        Self::Timeline,
        Self::Inspector,
        Self::Events,
        Self::Console,
    ];

    /// Get the display name for this panel type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Canvas => "Canvas",
            Self::Timeline => "Timeline",
            Self::Inspector => "Inspector",
            Self::Events => "Events",
            Self::Console => "Console",
        }
    }

    /// Get the icon for this panel type
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Canvas => "\u{1f5bc}",   // framed picture
            Self::Timeline => "\u{1f3ac}", // film
            Self::Inspector => "\u{2699}", // cog
            Self::Events => "\u{1f514}",   // bell
            Self::Console => "\u{1f4bb}",  // terminal
        }
    }
}
