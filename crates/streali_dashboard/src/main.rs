// SPDX-License-Identifier: MIT OR Apache-2.0
//! Streali Dashboard - alert overlay editor and live event feed
//!
//! A desktop dashboard for stream overlays featuring:
//! - Canvas editor with drag and resize of alert elements
//! - Timeline of when each element appears, with a preview clock
//! - Inspector for element and alert properties
//! - Live stream events with a persisted type filter
//! - Full undo/redo support
//!
//! ## Architecture
//!
//! The document model and the timeline widget live in `streali_alert`, the
//! event feed and its transports in `streali_events`. This binary wires
//! them into an egui window with `egui_dock` for panel docking.

mod app;
mod config;
mod file_watcher;
mod history;
mod live;
mod media;
mod panel_types;
mod panels;
mod renderer;
mod state;
mod toast;

use app::DashboardApp;
use panels::LogBridge;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    // Console bridge (channel pair)
    let (bridge_layer, log_rx) = LogBridge::new();

    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["streali_dashboard=debug", "streali_events=debug", "wgpu=warn", "naga=warn"] {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Invalid log directive {directive}: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(bridge_layer)
        .init();

    tracing::info!("Starting Streali Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config_path = config::default_config_path();
    if let Err(e) = DashboardApp::run(config_path, Some(log_rx)) {
        tracing::error!("Dashboard crashed: {e}");
        std::process::exit(1);
    }
}
