// SPDX-License-Identifier: MIT OR Apache-2.0
//! Log console panel.
//!
//! [`LogBridge`] is a `tracing_subscriber` layer that forwards every event to
//! the panel over a channel; the panel drains it once per frame.

use std::collections::VecDeque;
use std::sync::mpsc;

/// Entries kept before the oldest are dropped
const MAX_ENTRIES: usize = 1000;

/// A tracing event captured by the [`LogBridge`] layer.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// The log level.
    pub level: LogLevel,
    /// The formatted message.
    pub message: String,
    /// Module path that emitted the event.
    pub target: String,
    /// `file:line`, when known.
    pub location: Option<String>,
}

/// A `tracing_subscriber::Layer` that forwards events over an `mpsc` channel
/// so the [`ConsolePanel`] can display them.
pub struct LogBridge {
    sender: mpsc::Sender<LogRecord>,
}

impl LogBridge {
    /// Create a new bridge and return `(layer, receiver)`.
    pub fn new() -> (Self, mpsc::Receiver<LogRecord>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl<S> tracing_subscriber::Layer<S> for LogBridge
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let meta = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.finish();

        let location = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            _ => None,
        };

        // The receiver is gone once the window closes
        let _ = self.sender.send(LogRecord {
            level: LogLevel::from(*meta.level()),
            message,
            target: meta.target().to_string(),
            location,
        });
    }
}

/// Collects the `message` field and any other fields as `k = v`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: String) {
        if name == "message" {
            self.message = value;
        } else {
            self.fields.push(format!("{name} = {value}"));
        }
    }

    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (true, true) => "(empty)".to_string(),
            (true, false) => self.fields.join(", "),
            (false, true) => self.message,
            (false, false) => format!("{}, {}", self.message, self.fields.join(", ")),
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.push_field(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push_field(field.name(), value.to_string());
    }
}

/// Log level for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Trace
    Trace,
    /// Debug
    Debug,
    /// Info
    Info,
    /// Warn
    Warn,
    /// Error
    Error,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error];

    fn index(self) -> usize {
        self as usize
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    fn short_name(&self) -> &'static str {
        &self.name()[..1]
    }

    fn color(&self) -> egui::Color32 {
        match self {
            Self::Trace => egui::Color32::from_rgb(100, 100, 100),
            Self::Debug => egui::Color32::from_rgb(150, 150, 150),
            Self::Info => egui::Color32::from_rgb(200, 200, 200),
            Self::Warn => egui::Color32::from_rgb(255, 200, 80),
            Self::Error => egui::Color32::from_rgb(255, 100, 100),
        }
    }

    fn bg_color(&self) -> egui::Color32 {
        match self {
            Self::Warn => egui::Color32::from_rgba_unmultiplied(255, 200, 80, 20),
            Self::Error => egui::Color32::from_rgba_unmultiplied(255, 100, 100, 30),
            Self::Trace | Self::Debug | Self::Info => egui::Color32::TRANSPARENT,
        }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

/// A log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Level
    pub level: LogLevel,
    /// `[target] message`
    pub message: String,
    /// Local wall-clock time, `HH:MM:SS`
    pub timestamp: String,
    /// `file:line`, when known
    pub location: Option<String>,
    /// Number of identical consecutive messages folded into this entry
    pub count: u32,
}

/// The console panel
pub struct ConsolePanel {
    receiver: Option<mpsc::Receiver<LogRecord>>,
    entries: VecDeque<LogEntry>,
    search: String,
    auto_scroll: bool,
    show_timestamps: bool,
    collapse_duplicates: bool,
    visible_levels: [bool; 5],
    counts: [usize; 5],
}

impl ConsolePanel {
    /// Create a console fed by `receiver`
    pub fn new(receiver: Option<mpsc::Receiver<LogRecord>>) -> Self {
        Self {
            receiver,
            entries: VecDeque::new(),
            search: String::new(),
            auto_scroll: true,
            show_timestamps: true,
            collapse_duplicates: true,
            visible_levels: [true; 5],
            counts: [0; 5],
        }
    }

    /// Append an entry
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>, location: Option<String>) {
        let message = message.into();
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.counts[level.index()] += 1;

        if self.collapse_duplicates {
            if let Some(last) = self.entries.back_mut() {
                if last.level == level && last.message == message {
                    last.count += 1;
                    last.timestamp = timestamp;
                    return;
                }
            }
        }

        self.entries.push_back(LogEntry {
            level,
            message,
            timestamp,
            location,
            count: 1,
        });
        while self.entries.len() > MAX_ENTRIES {
            self.entries.pop_front();
        }
    }

    /// Entries currently held, oldest first
    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    /// Number of entries logged at `level` since the last clear
    pub fn count(&self, level: LogLevel) -> usize {
        self.counts[level.index()]
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts = [0; 5];
    }

    /// Drain pending tracing events into the log.
    pub fn poll(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        let records: Vec<LogRecord> = receiver.try_iter().collect();
        for record in records {
            let message = format!("[{}] {}", record.target, record.message);
            self.log(record.level, message, record.location);
        }
    }

    fn is_shown(&self, entry: &LogEntry, search: &str) -> bool {
        self.visible_levels[entry.level.index()]
            && (search.is_empty() || entry.message.to_lowercase().contains(search))
    }

    /// Render the console panel
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        self.poll();

        ui.horizontal(|ui| {
            if ui.button("Clear").on_hover_text("Clear all logs").clicked() {
                self.clear();
            }
            ui.separator();

            for level in LogLevel::ALL {
                let text = format!("{} {}", level.short_name(), self.count(level));
                let shown = &mut self.visible_levels[level.index()];
                let color = if *shown { level.color() } else { egui::Color32::GRAY };
                if ui
                    .add(egui::Button::new(egui::RichText::new(text).color(color).monospace()))
                    .on_hover_text(format!("{} messages", level.name()))
                    .clicked()
                {
                    *shown = !*shown;
                }
            }
            ui.separator();

            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search...")
                    .desired_width(150.0),
            );
            if !self.search.is_empty() && ui.button("x").on_hover_text("Clear search").clicked() {
                self.search.clear();
            }
            ui.separator();

            ui.menu_button("Options", |ui| {
                ui.checkbox(&mut self.auto_scroll, "Auto-scroll");
                ui.checkbox(&mut self.show_timestamps, "Show timestamps");
                ui.checkbox(&mut self.collapse_duplicates, "Collapse duplicates");
            });
        });

        ui.separator();

        let search = self.search.to_lowercase();
        let show_timestamps = self.show_timestamps;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(self.auto_scroll)
            .show(ui, |ui| {
                for entry in self.entries().iter().filter(|e| self.is_shown(e, &search)) {
                    entry_row(ui, entry, show_timestamps);
                }
            });
    }
}

fn entry_row(ui: &mut egui::Ui, entry: &LogEntry, show_timestamp: bool) {
    let response = ui.horizontal(|ui| {
        let bg_color = entry.level.bg_color();
        if bg_color != egui::Color32::TRANSPARENT {
            let rect = ui.available_rect_before_wrap();
            ui.painter().rect_filled(
                egui::Rect::from_min_size(rect.min, egui::vec2(ui.available_width(), 18.0)),
                0.0,
                bg_color,
            );
        }

        if show_timestamp {
            ui.label(
                egui::RichText::new(&entry.timestamp)
                    .monospace()
                    .size(11.0)
                    .color(egui::Color32::from_rgb(100, 100, 100)),
            );
        }

        ui.label(
            egui::RichText::new(format!("[{}]", entry.level.short_name()))
                .monospace()
                .size(11.0)
                .color(entry.level.color()),
        );

        if entry.count > 1 {
            ui.label(
                egui::RichText::new(format!("({})", entry.count))
                    .monospace()
                    .size(10.0)
                    .color(egui::Color32::from_rgb(150, 150, 200)),
            );
        }

        ui.label(
            egui::RichText::new(&entry.message)
                .monospace()
                .size(12.0)
                .color(entry.level.color()),
        );
    });

    response.response.context_menu(|ui| {
        if ui.button("Copy message").clicked() {
            ui.output_mut(|o| o.copied_text = entry.message.clone());
            ui.close_menu();
        }
        if let Some(location) = &entry.location {
            if ui.button("Copy source location").clicked() {
                ui.output_mut(|o| o.copied_text = location.clone());
                ui.close_menu();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_duplicates_collapse() {
        let mut console = ConsolePanel::new(None);
        console.log(LogLevel::Info, "Saved alert", None);
        console.log(LogLevel::Info, "Saved alert", None);
        console.log(LogLevel::Warn, "Saved alert", None);

        assert_eq!(console.entries().len(), 2);
        assert_eq!(console.entries()[0].count, 2);
        assert_eq!(console.count(LogLevel::Info), 2);
    }

    #[test]
    fn test_entries_are_bounded() {
        let mut console = ConsolePanel::new(None);
        for i in 0..(MAX_ENTRIES + 5) {
            console.log(LogLevel::Debug, format!("event {i}"), None);
        }
        assert_eq!(console.entries().len(), MAX_ENTRIES);
        assert_eq!(console.entries()[0].message, "event 5");
    }

    #[test]
    fn test_bridge_forwards_events() {
        let (bridge, receiver) = LogBridge::new();
        let subscriber = tracing_subscriber::registry().with(bridge);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(user_id = 7, "Event stream closed");
        });

        let mut console = ConsolePanel::new(Some(receiver));
        console.poll();

        let entry = &console.entries()[0];
        assert_eq!(entry.level, LogLevel::Warn);
        assert!(entry.message.contains("Event stream closed"));
        assert!(entry.message.contains("user_id = 7"));
        assert!(entry.location.is_some());
    }
}
