// SPDX-License-Identifier: MIT OR Apache-2.0
//! Events dashboard panel - live feed, type filter and embed link.

use crate::live::{ConnectionStatus, LiveEvents};
use crate::toast::Toasts;
use streali_events::{embed_link, EventKind, StreamEvent};

/// What the panel asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventsResponse {
    /// Reconnect to the backend
    pub reconnect: bool,
}

/// The events panel
#[derive(Default)]
pub struct EventsPanel {
    search: String,
}

impl EventsPanel {
    /// Create the panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the panel
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        live: &mut LiveEvents,
        toasts: &mut Toasts,
        embed_host: &str,
    ) -> EventsResponse {
        let mut response = EventsResponse::default();

        ui.horizontal(|ui| {
            let status = live.status();
            ui.colored_label(status_color(status), "\u{25cf}");
            ui.label(status.label());
            if live.is_loading() {
                ui.spinner();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button("Add to OBS")
                    .on_hover_text("Copy the browser-source link for this event list")
                    .clicked()
                {
                    let link = embed_link(embed_host);
                    tracing::info!("Copied embed link {}", link);
                    ui.ctx().output_mut(|o| o.copied_text = link);
                    toasts.success("Embed link copied!");
                }
                if ui.button("\u{27f3} Reconnect").clicked() {
                    response.reconnect = true;
                }
            });
        });

        ui.separator();
        self.filter_ui(ui, live, toasts);
        ui.separator();

        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search user...")
                    .desired_width(160.0),
            );
            if !self.search.is_empty() && ui.button("x").clicked() {
                self.search.clear();
            }
        });

        let search = self.search.to_lowercase();
        let events: Vec<&StreamEvent> = live
            .visible()
            .into_iter()
            .filter(|event| {
                search.is_empty()
                    || event
                        .username()
                        .is_some_and(|name| name.to_lowercase().contains(&search))
            })
            .collect();

        ui.label(
            egui::RichText::new(format!("{} shown / {} received", events.len(), live.total()))
                .small()
                .weak(),
        );

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if events.is_empty() {
                    ui.weak("No events yet");
                }
                for event in events {
                    event_row(ui, event);
                }
            });

        response
    }

    fn filter_ui(&mut self, ui: &mut egui::Ui, live: &mut LiveEvents, toasts: &mut Toasts) {
        egui::CollapsingHeader::new("Event types")
            .default_open(true)
            .show(ui, |ui| {
                let checks = live.filter().checks().to_vec();
                ui.horizontal_wrapped(|ui| {
                    for check in checks {
                        let mut checked = check.checked;
                        if ui.checkbox(&mut checked, &check.label).changed() {
                            if let Err(e) = live.set_checked(&check.label, checked) {
                                tracing::error!("Failed to save event filter: {}", e);
                                toasts.error(format!("Could not save filter: {e}"));
                            }
                        }
                    }
                });
                if ui.button("Select all").clicked() {
                    if let Err(e) = live.select_all() {
                        tracing::error!("Failed to save event filter: {}", e);
                        toasts.error(format!("Could not save filter: {e}"));
                    }
                }
            });
    }
}

fn event_row(ui: &mut egui::Ui, event: &StreamEvent) {
    let color = kind_color(event.kind());
    let frame = egui::Frame::group(ui.style()).stroke(egui::Stroke::new(1.0, color.gamma_multiply(0.6)));

    let response = frame
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.colored_label(color, egui::RichText::new(event.label()).strong());
                if let Some(name) = event.username() {
                    ui.label(name);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let local = event.created_at.with_timezone(&chrono::Local);
                    ui.weak(local.format("%H:%M:%S").to_string());
                });
            });
        })
        .response;

    response.on_hover_ui(|ui| {
        ui.label(format!("#{} - {}", event.id, event.created_at.to_rfc3339()));
        if !event.payload.is_empty() {
            ui.monospace(serde_json::to_string_pretty(&event.payload).unwrap_or_default());
        }
    });
}

fn status_color(status: &ConnectionStatus) -> egui::Color32 {
    match status {
        ConnectionStatus::Live => egui::Color32::from_rgb(80, 200, 100),
        ConnectionStatus::Connecting => egui::Color32::from_rgb(230, 200, 80),
        ConnectionStatus::Failed(_) => egui::Color32::from_rgb(230, 90, 90),
        ConnectionStatus::Disconnected | ConnectionStatus::Closed => egui::Color32::GRAY,
    }
}

fn kind_color(kind: Option<EventKind>) -> egui::Color32 {
    match kind {
        Some(EventKind::Follow) => egui::Color32::from_rgb(120, 170, 255),
        Some(EventKind::Bits) => egui::Color32::from_rgb(180, 120, 255),
        Some(EventKind::Subscribe | EventKind::SubscriptionGift) => egui::Color32::from_rgb(255, 170, 60),
        Some(EventKind::Raid) => egui::Color32::from_rgb(255, 100, 120),
        Some(_) => egui::Color32::from_rgb(100, 210, 180),
        None => egui::Color32::GRAY,
    }
}
