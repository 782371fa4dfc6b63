// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dashboard panel implementations.

mod canvas;
mod timeline;
mod inspector;
mod events;
pub mod console;

pub use canvas::CanvasPanel;
pub use timeline::TimelinePanel;
pub use inspector::InspectorPanel;
pub use events::{EventsPanel, EventsResponse};
pub use console::{ConsolePanel, LogBridge};
