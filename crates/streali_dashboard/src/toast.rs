// SPDX-License-Identifier: MIT OR Apache-2.0
//! Short-lived notifications shown in the corner of the window.

use egui::Color32;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a toast stays up
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Maximum toasts on screen at once
const MAX_TOASTS: usize = 5;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Something worked
    Success,
    /// Neutral information
    Info,
    /// Something failed
    Error,
}

impl ToastKind {
    fn color(&self) -> Color32 {
        match self {
            Self::Success => Color32::from_rgb(80, 180, 100),
            Self::Info => Color32::from_rgb(100, 160, 230),
            Self::Error => Color32::from_rgb(230, 90, 90),
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            Self::Success => "\u{2714}",
            Self::Info => "\u{2139}",
            Self::Error => "\u{2716}",
        }
    }
}

/// A single notification
#[derive(Debug, Clone)]
pub struct Toast {
    /// Severity
    pub kind: ToastKind,
    /// Text shown
    pub message: String,
    expires_at: Instant,
}

/// Queue of active toasts
#[derive(Debug, Default)]
pub struct Toasts {
    toasts: VecDeque<Toast>,
}

impl Toasts {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a toast that expires [`TOAST_DURATION`] after `now`
    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) {
        self.toasts.push_back(Toast {
            kind,
            message: message.into(),
            expires_at: now + TOAST_DURATION,
        });
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
    }

    /// Show a success toast
    pub fn success(&mut self, message: impl Into<String>) {
        self.push_at(ToastKind::Success, message, Instant::now());
    }

    /// Show an info toast
    pub fn info(&mut self, message: impl Into<String>) {
        self.push_at(ToastKind::Info, message, Instant::now());
    }

    /// Show an error toast
    pub fn error(&mut self, message: impl Into<String>) {
        self.push_at(ToastKind::Error, message, Instant::now());
    }

    /// Drop toasts that have expired by `now`
    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    /// Toasts still on screen, oldest first
    pub fn active(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Whether nothing is showing
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Draw the toasts stacked in the bottom-right corner
    pub fn show(&mut self, ctx: &egui::Context) {
        self.prune(Instant::now());
        if self.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::bottom_up(egui::Align::Max), |ui| {
                    for toast in self.toasts.iter().rev() {
                        egui::Frame::popup(ui.style())
                            .stroke(egui::Stroke::new(1.0, toast.kind.color()))
                            .show(ui, |ui| {
                                ui.horizontal(|ui| {
                                    ui.colored_label(toast.kind.color(), toast.kind.icon());
                                    ui.label(&toast.message);
                                });
                            });
                    }
                });
            });

        // Keep repainting so expired toasts disappear without input
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let mut toasts = Toasts::new();
        let now = Instant::now();
        toasts.push_at(ToastKind::Success, "Embed link copied!", now);

        toasts.prune(now + Duration::from_secs(1));
        assert_eq!(toasts.active().count(), 1);

        toasts.prune(now + TOAST_DURATION);
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_oldest_toast_is_dropped_when_full() {
        let mut toasts = Toasts::new();
        let now = Instant::now();
        for i in 0..(MAX_TOASTS + 2) {
            toasts.push_at(ToastKind::Info, format!("toast {i}"), now);
        }

        assert_eq!(toasts.active().count(), MAX_TOASTS);
        assert_eq!(toasts.active().next().unwrap().message, "toast 2");
    }
}
