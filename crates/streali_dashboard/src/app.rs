// SPDX-License-Identifier: MIT OR Apache-2.0
//! Main dashboard application setup and event loop.

use crate::config::{load_config, save_config, DashboardConfig};
use crate::file_watcher::{DocumentWatcher, FileEvent, DEFAULT_DEBOUNCE};
use crate::live::{LiveEvents, LiveNotice};
use crate::media::MediaCache;
use crate::panel_types::PanelType;
use crate::panels::console::LogRecord;
use crate::panels::{CanvasPanel, ConsolePanel, EventsPanel, InspectorPanel, TimelinePanel};
use crate::renderer::GraphicsState;
use crate::state::{with_document_extension, DashboardState, DocumentError};
use crate::toast::Toasts;
use egui_dock::{DockArea, DockState, NodeIndex, Style, TabViewer};
use egui_wgpu::wgpu;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use streali_events::{default_filter_path, ApiClient, FilterStore};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Dashboard application errors
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Tab viewer implementation for `egui_dock`
pub struct DashboardTabViewer<'a> {
    state: &'a mut DashboardState,
    canvas: &'a mut CanvasPanel,
    timeline: &'a mut TimelinePanel,
    inspector: &'a mut InspectorPanel,
    events: &'a mut EventsPanel,
    console: &'a mut ConsolePanel,
    live: &'a mut LiveEvents,
    media: &'a MediaCache,
    toasts: &'a mut Toasts,
    config: &'a DashboardConfig,
    /// Set when the events panel asks for a reconnect
    reconnect: bool,
}

impl<'a> TabViewer for DashboardTabViewer<'a> {
    type Tab = PanelType;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        format!("{} {}", tab.icon(), tab.name()).into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        match tab {
            PanelType::Canvas => {
                let playhead = self.timeline.playhead();
                self.canvas
                    .ui(ui, self.state, self.media, playhead, &self.config.username);
            }
            PanelType::Timeline => self.timeline.ui(ui, self.state),
            PanelType::Inspector => self.inspector.ui(ui, self.state),
            PanelType::Events => {
                let response = self
                    .events
                    .ui(ui, self.live, self.toasts, &self.config.embed_host);
                self.reconnect |= response.reconnect;
            }
            PanelType::Console => self.console.ui(ui),
        }
    }

    fn closeable(&mut self, _tab: &mut Self::Tab) -> bool {
        true
    }
}

/// Running state of the dashboard
struct DashboardRunning {
    window: Arc<Window>,
    graphics: GraphicsState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    dashboard: DashboardInner,
    /// Title last pushed to the window
    title: String,
}

/// Simple file dialog state
#[derive(Debug, Clone, PartialEq)]
enum FileDialogMode {
    None,
    Open,
    SaveAs,
}

/// Action deferred behind the unsaved changes prompt
type PendingAction = Box<dyn FnOnce(&mut DashboardInner)>;

/// An action held until the user resolves the unsaved changes prompt.
///
/// Choosing Save on an untitled document parks the action until the
/// Save As dialog finishes; it runs only if that save succeeds.
struct Deferred<A> {
    action: Option<A>,
    awaiting_save: bool,
}

impl<A> Default for Deferred<A> {
    fn default() -> Self {
        Self {
            action: None,
            awaiting_save: false,
        }
    }
}

impl<A> Deferred<A> {
    fn hold(&mut self, action: A) {
        self.action = Some(action);
        self.awaiting_save = false;
    }

    fn proceed(&mut self) -> Option<A> {
        self.awaiting_save = false;
        self.action.take()
    }

    fn discard(&mut self) {
        self.action = None;
        self.awaiting_save = false;
    }

    fn await_save(&mut self) {
        self.awaiting_save = self.action.is_some();
    }

    /// Resolve a Save As started from the prompt
    fn save_finished(&mut self, saved: bool) -> Option<A> {
        if !self.awaiting_save {
            return None;
        }
        self.awaiting_save = false;
        let action = self.action.take();
        if saved {
            action
        } else {
            None
        }
    }
}

/// Inner dashboard state and panels
struct DashboardInner {
    state: DashboardState,
    config: DashboardConfig,
    config_path: PathBuf,
    api: ApiClient,
    live: LiveEvents,
    media: MediaCache,
    watcher: Option<DocumentWatcher>,
    toasts: Toasts,
    dock_state: DockState<PanelType>,
    canvas: CanvasPanel,
    timeline: TimelinePanel,
    inspector: InspectorPanel,
    events: EventsPanel,
    console: ConsolePanel,
    /// File dialog mode
    file_dialog_mode: FileDialogMode,
    /// File dialog path input
    file_dialog_path: String,
    /// Show unsaved changes warning
    show_unsaved_warning: bool,
    /// Pending action after unsaved warning
    pending_action: Deferred<PendingAction>,
    /// Settings window, holding the edited copy of the config
    settings_draft: Option<DashboardConfig>,
    /// Whether the app should exit (set by the unsaved changes dialog)
    request_exit: bool,
}

impl DashboardInner {
    fn new(config_path: PathBuf, log_rx: Option<Receiver<LogRecord>>) -> Self {
        let mut config = load_config(&config_path);
        config.apply_overrides(|key| std::env::var(key).ok());

        let watcher = match DocumentWatcher::new(DEFAULT_DEBOUNCE) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("File watching disabled: {}", e);
                None
            }
        };

        let api = ApiClient::new(config.api_base_url.clone());
        let mut live = LiveEvents::new(FilterStore::open(default_filter_path()));
        live.connect(&api, &config.user_id);

        let mut dashboard = Self {
            state: DashboardState::new(),
            canvas: CanvasPanel::new(config.canvas_zoom),
            timeline: TimelinePanel::new(config.pixels_per_second),
            config,
            config_path,
            api,
            live,
            media: MediaCache::new(),
            watcher,
            toasts: Toasts::new(),
            dock_state: Self::create_default_layout(),
            inspector: InspectorPanel::new(),
            events: EventsPanel::new(),
            console: ConsolePanel::new(log_rx),
            file_dialog_mode: FileDialogMode::None,
            file_dialog_path: String::new(),
            show_unsaved_warning: false,
            pending_action: Deferred::default(),
            settings_draft: None,
            request_exit: false,
        };

        if let Some(path) = dashboard.config.alert_path.clone() {
            if path.exists() {
                dashboard.open_document(path);
            } else {
                tracing::warn!("Last alert {:?} no longer exists", path);
            }
        }

        dashboard
    }

    fn create_default_layout() -> DockState<PanelType> {
        let mut dock_state = DockState::new(vec![PanelType::Canvas]);
        let surface = dock_state.main_surface_mut();

        // Inspector on the right
        let [center, _right] = surface.split_right(NodeIndex::root(), 0.75, vec![PanelType::Inspector]);

        // Events on the left
        let [center, _left] = surface.split_left(center, 0.28, vec![PanelType::Events]);

        // Timeline and console under the canvas
        let [_top, _bottom] = surface.split_below(center, 0.62, vec![PanelType::Timeline, PanelType::Console]);

        dock_state
    }

    fn update(&mut self, ctx: &egui::Context) {
        self.console.poll();
        self.poll_live();
        self.poll_watcher();
        if self.media.update(ctx) {
            ctx.request_repaint();
        }
        self.timeline.tick(ctx, &self.state);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                self.file_menu(ui);
                self.edit_menu(ui);
                self.view_menu(ui);
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.status_bar(ui);
        });

        let mut tab_viewer = DashboardTabViewer {
            state: &mut self.state,
            canvas: &mut self.canvas,
            timeline: &mut self.timeline,
            inspector: &mut self.inspector,
            events: &mut self.events,
            console: &mut self.console,
            live: &mut self.live,
            media: &self.media,
            toasts: &mut self.toasts,
            config: &self.config,
            reconnect: false,
        };

        DockArea::new(&mut self.dock_state)
            .style(Style::from_egui(ctx.style().as_ref()))
            .show(ctx, &mut tab_viewer);

        let reconnect = tab_viewer.reconnect;
        if reconnect {
            self.reconnect();
        }

        self.show_file_dialog(ctx);
        self.show_unsaved_warning_dialog(ctx);
        self.show_settings(ctx);
        self.toasts.show(ctx);

        self.handle_shortcuts(ctx);
        self.sync_view_settings();
    }

    fn poll_live(&mut self) {
        for notice in self.live.poll() {
            match notice {
                LiveNotice::HistoryLoaded(count) => self.toasts.info(format!("Loaded {count} past events")),
                LiveNotice::HistoryFailed(reason) => {
                    self.toasts.error(format!("Could not load events: {reason}"));
                }
                LiveNotice::Connected => self.toasts.success("Live events connected"),
                LiveNotice::StreamFailed(reason) => {
                    self.toasts.error(format!("Live events failed: {reason}"));
                }
            }
        }
    }

    fn poll_watcher(&mut self) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        for event in watcher.poll_events() {
            match event {
                FileEvent::Modified(path) => match self.state.reload_from_disk() {
                    Ok(true) => self.toasts.info(format!("Reloaded {}", display_name(&path))),
                    Ok(false) => {
                        if self.state.has_unsaved_changes() {
                            self.toasts
                                .info(format!("{} changed on disk; keeping your edits", display_name(&path)));
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to reload {:?}: {}", path, e);
                        self.toasts.error(format!("Could not reload: {e}"));
                    }
                },
                FileEvent::Removed(path) => {
                    tracing::warn!("{:?} was removed from disk", path);
                    self.toasts.error(format!("{} was removed from disk", display_name(&path)));
                }
                FileEvent::Error(e) => tracing::warn!("File watcher error: {}", e),
            }
        }
    }

    fn reconnect(&mut self) {
        self.api = ApiClient::new(self.config.api_base_url.clone());
        self.live.connect(&self.api, &self.config.user_id);
        if !self.config.has_user() {
            self.toasts.info("Set a user id in Settings to receive events");
        }
    }

    /// Mirror view settings into the config, written out on the next save
    fn sync_view_settings(&mut self) {
        self.config.canvas_zoom = self.canvas.zoom;
        self.config.pixels_per_second = self.timeline.pixels_per_second();
    }

    fn save_config(&mut self) {
        if let Err(e) = save_config(&self.config, &self.config_path) {
            tracing::error!("Failed to save config: {}", e);
            self.toasts.error(format!("Could not save settings: {e}"));
        }
    }

    /// Bind the watcher and config to the document's current path
    fn document_changed(&mut self) {
        let path = self.state.document_path().map(Path::to_path_buf);
        if let Some(watcher) = &mut self.watcher {
            match &path {
                Some(path) => {
                    if let Err(e) = watcher.watch(path) {
                        tracing::warn!("Failed to watch {:?}: {}", path, e);
                    }
                }
                None => watcher.unwatch(),
            }
        }
        if let Some(path) = &path {
            self.config.add_recent(path.clone());
        }
        self.config.alert_path = path;
        self.save_config();
    }

    fn new_document(&mut self) {
        self.state.new_document();
        self.timeline.timeline.playback.stop();
        self.document_changed();
    }

    fn open_document(&mut self, path: PathBuf) {
        match self.state.load(&path) {
            Ok(()) => {
                self.timeline.timeline.playback.stop();
                self.toasts.success(format!("Opened {}", display_name(&path)));
                self.document_changed();
            }
            Err(e) => {
                tracing::error!("Failed to open {:?}: {}", path, e);
                self.toasts.error(format!("Could not open {}: {e}", display_name(&path)));
            }
        }
    }

    fn save_document(&mut self) {
        match self.state.save() {
            Ok(path) => self.toasts.success(format!("Saved {}", display_name(&path))),
            Err(DocumentError::NoPath) => self.open_save_as(),
            Err(e) => {
                tracing::error!("Failed to save: {}", e);
                self.toasts.error(format!("Could not save: {e}"));
            }
        }
    }

    fn save_document_as(&mut self, path: PathBuf) -> bool {
        let path = with_document_extension(path);
        match self.state.save_to(&path) {
            Ok(()) => {
                self.toasts.success(format!("Saved {}", display_name(&path)));
                self.document_changed();
                true
            }
            Err(e) => {
                tracing::error!("Failed to save {:?}: {}", path, e);
                self.toasts.error(format!("Could not save: {e}"));
                false
            }
        }
    }

    fn open_save_as(&mut self) {
        self.file_dialog_mode = FileDialogMode::SaveAs;
        self.file_dialog_path = self
            .state
            .document_path()
            .and_then(Path::to_str)
            .unwrap_or("alert.alert.ron")
            .to_string();
    }

    /// Run `action` now, or after the user confirms discarding edits
    fn guard_unsaved(&mut self, action: impl FnOnce(&mut DashboardInner) + 'static) {
        if self.state.has_unsaved_changes() {
            self.show_unsaved_warning = true;
            self.pending_action.hold(Box::new(action));
        } else {
            action(self);
        }
    }

    /// Persist what should survive a restart
    fn shutdown(&mut self) {
        self.live.disconnect();
        self.save_config();
        tracing::info!("Dashboard shut down");
    }

    fn show_file_dialog(&mut self, ctx: &egui::Context) {
        let title = match self.file_dialog_mode {
            FileDialogMode::Open => "Open Alert",
            FileDialogMode::SaveAs => "Save Alert As",
            FileDialogMode::None => return,
        };

        let mut should_close = false;
        let mut confirmed = false;

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Path:");
                    let response =
                        ui.add(egui::TextEdit::singleline(&mut self.file_dialog_path).desired_width(300.0));
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        confirmed = true;
                    }
                });

                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        should_close = true;
                    }

                    let action_text = match self.file_dialog_mode {
                        FileDialogMode::Open => "Open",
                        FileDialogMode::SaveAs => "Save",
                        FileDialogMode::None => "OK",
                    };
                    let has_path = !self.file_dialog_path.trim().is_empty();
                    if ui.add_enabled(has_path, egui::Button::new(action_text)).clicked() {
                        confirmed = true;
                    }
                });
            });

        if confirmed && !self.file_dialog_path.trim().is_empty() {
            let path = PathBuf::from(self.file_dialog_path.trim());
            match self.file_dialog_mode {
                FileDialogMode::Open => self.guard_unsaved(move |dashboard| dashboard.open_document(path)),
                FileDialogMode::SaveAs => {
                    let saved = self.save_document_as(path);
                    if let Some(action) = self.pending_action.save_finished(saved) {
                        action(self);
                    }
                }
                FileDialogMode::None => {}
            }
            should_close = true;
        }

        if should_close {
            if self.file_dialog_mode == FileDialogMode::SaveAs {
                self.pending_action.save_finished(false);
            }
            self.file_dialog_mode = FileDialogMode::None;
        }
    }

    fn show_unsaved_warning_dialog(&mut self, ctx: &egui::Context) {
        if !self.show_unsaved_warning {
            return;
        }

        let mut should_close = false;
        let mut proceed = false;

        egui::Window::new("Unsaved Changes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("You have unsaved changes. Do you want to continue?");
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        should_close = true;
                    }
                    if ui.button("Don't Save").clicked() {
                        proceed = true;
                        should_close = true;
                    }
                    if ui.button("Save").clicked() {
                        if self.state.document_path().is_some() {
                            match self.state.save() {
                                Ok(_) => proceed = true,
                                Err(e) => {
                                    tracing::error!("Failed to save: {}", e);
                                    self.toasts.error(format!("Could not save: {e}"));
                                }
                            }
                        } else {
                            // Needs a path first; the action waits for Save As
                            self.pending_action.await_save();
                            self.open_save_as();
                        }
                        should_close = true;
                    }
                });
            });

        if should_close {
            self.show_unsaved_warning = false;
            if proceed {
                if let Some(action) = self.pending_action.proceed() {
                    action(self);
                }
            } else if !self.pending_action.awaiting_save {
                self.pending_action.discard();
            }
        }
    }

    fn show_settings(&mut self, ctx: &egui::Context) {
        let Some(draft) = self.settings_draft.as_mut() else {
            return;
        };

        let mut open = true;
        let mut apply = false;
        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid").num_columns(2).show(ui, |ui| {
                    ui.label("API URL");
                    ui.text_edit_singleline(&mut draft.api_base_url);
                    ui.end_row();

                    ui.label("User id");
                    ui.text_edit_singleline(&mut draft.user_id);
                    ui.end_row();

                    ui.label("Preview username");
                    ui.text_edit_singleline(&mut draft.username);
                    ui.end_row();

                    ui.label("Embed host");
                    ui.text_edit_singleline(&mut draft.embed_host);
                    ui.end_row();
                });

                ui.add_space(8.0);
                if ui.button("Apply").clicked() {
                    apply = true;
                }
            });

        if apply {
            if let Some(draft) = self.settings_draft.take() {
                let reconnect =
                    draft.api_base_url != self.config.api_base_url || draft.user_id != self.config.user_id;
                self.config.api_base_url = draft.api_base_url;
                self.config.user_id = draft.user_id;
                self.config.username = draft.username;
                self.config.embed_host = draft.embed_host;
                self.save_config();
                if reconnect {
                    self.reconnect();
                }
                self.toasts.success("Settings saved");
            }
        } else if !open {
            self.settings_draft = None;
        }
    }

    fn file_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("File", |ui| {
            if ui.button("New Alert (Ctrl+N)").clicked() {
                self.guard_unsaved(DashboardInner::new_document);
                ui.close_menu();
            }
            if ui.button("Open Alert... (Ctrl+O)").clicked() {
                self.file_dialog_mode = FileDialogMode::Open;
                self.file_dialog_path = String::new();
                ui.close_menu();
            }

            let has_recent = !self.config.recent_documents.is_empty();
            ui.add_enabled_ui(has_recent, |ui| {
                ui.menu_button("Open Recent", |ui| {
                    let recent: Vec<PathBuf> = self.config.recent_documents.iter().cloned().collect();
                    for path in recent {
                        let full_path = path.to_string_lossy().to_string();
                        if ui.button(display_name(&path)).on_hover_text(full_path).clicked() {
                            self.guard_unsaved(move |dashboard| dashboard.open_document(path));
                            ui.close_menu();
                        }
                    }

                    ui.separator();
                    if ui.button("Clear Recent").clicked() {
                        self.config.recent_documents.clear();
                        self.save_config();
                        ui.close_menu();
                    }
                });
            });

            ui.separator();

            if ui.button("Save Alert (Ctrl+S)").clicked() {
                self.save_document();
                ui.close_menu();
            }
            if ui.button("Save Alert As...").clicked() {
                self.open_save_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Settings...").clicked() {
                self.settings_draft = Some(self.config.clone());
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Exit").clicked() {
                self.guard_unsaved(|dashboard| dashboard.request_exit = true);
                ui.close_menu();
            }
        });
    }

    fn edit_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("Edit", |ui| {
            let can_undo = self.state.history.can_undo();
            let can_redo = self.state.history.can_redo();

            let undo_text = match self.state.history.undo_description() {
                Some(desc) => format!("Undo: {} (Ctrl+Z)", desc),
                None => "Undo (Ctrl+Z)".to_string(),
            };
            if ui.add_enabled(can_undo, egui::Button::new(undo_text)).clicked() {
                self.undo();
                ui.close_menu();
            }

            let redo_text = match self.state.history.redo_description() {
                Some(desc) => format!("Redo: {} (Ctrl+Y)", desc),
                None => "Redo (Ctrl+Y)".to_string(),
            };
            if ui.add_enabled(can_redo, egui::Button::new(redo_text)).clicked() {
                self.redo();
                ui.close_menu();
            }

            ui.separator();
            let has_selection = self.state.selected.is_some();
            if ui.add_enabled(has_selection, egui::Button::new("Duplicate (Ctrl+D)")).clicked() {
                self.duplicate_selected();
                ui.close_menu();
            }
            if ui.add_enabled(has_selection, egui::Button::new("Delete (Del)")).clicked() {
                self.delete_selected();
                ui.close_menu();
            }
        });
    }

    fn view_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("View", |ui| {
            ui.menu_button("Panels", |ui| {
                for panel in PanelType::ALL {
                    if ui.button(format!("{} {}", panel.icon(), panel.name())).clicked() {
                        self.open_panel(panel);
                        ui.close_menu();
                    }
                }
            });
            ui.separator();
            if ui.button("Reset Layout").clicked() {
                self.dock_state = Self::create_default_layout();
                ui.close_menu();
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            match self.state.document_path() {
                Some(path) => ui.label(path.display().to_string()),
                None => ui.weak("Unsaved alert"),
            };
            if self.state.has_unsaved_changes() {
                ui.colored_label(egui::Color32::YELLOW, "modified");
            }
            ui.separator();
            ui.label(format!("{} elements", self.state.alert.element_count()));
            if let Some(element) = self.state.selected_element() {
                ui.separator();
                ui.label(format!("{} {}", element.element_type().icon(), element.title));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let errors = self.console.count(crate::panels::console::LogLevel::Error);
                if errors > 0 {
                    ui.colored_label(egui::Color32::from_rgb(230, 90, 90), format!("{errors} errors"));
                    ui.separator();
                }
                ui.label(self.live.status().label());
                if self.media.is_loading() {
                    ui.separator();
                    ui.spinner();
                }
            });
        });
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::{Key, KeyboardShortcut, Modifiers};

        const SAVE: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::S);
        const NEW: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::N);
        const OPEN: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
        const UNDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
        const REDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);
        const DUPLICATE: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::D);

        let (save, new, open) = ctx.input_mut(|i| {
            (i.consume_shortcut(&SAVE), i.consume_shortcut(&NEW), i.consume_shortcut(&OPEN))
        });
        if save {
            self.save_document();
        }
        if new {
            self.guard_unsaved(DashboardInner::new_document);
        }
        if open {
            self.file_dialog_mode = FileDialogMode::Open;
            self.file_dialog_path = String::new();
        }

        // Text fields keep their own editing keys
        if ctx.wants_keyboard_input() {
            return;
        }
        let (undo, redo, duplicate, delete) = ctx.input_mut(|i| {
            (
                i.consume_shortcut(&UNDO),
                i.consume_shortcut(&REDO),
                i.consume_shortcut(&DUPLICATE),
                i.consume_key(Modifiers::NONE, Key::Delete),
            )
        });
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }
        if duplicate {
            self.duplicate_selected();
        }
        if delete {
            self.delete_selected();
        }
    }

    fn undo(&mut self) {
        match self.state.undo() {
            Ok(description) => tracing::debug!("Undid {}", description),
            Err(err) => tracing::warn!("Undo failed: {err}"),
        }
    }

    fn redo(&mut self) {
        match self.state.redo() {
            Ok(description) => tracing::debug!("Redid {}", description),
            Err(err) => tracing::warn!("Redo failed: {err}"),
        }
    }

    fn duplicate_selected(&mut self) {
        if let Err(e) = self.state.duplicate_selected() {
            tracing::error!("Failed to duplicate element: {}", e);
        }
    }

    fn delete_selected(&mut self) {
        if let Err(e) = self.state.delete_selected() {
            tracing::error!("Failed to delete element: {}", e);
        }
    }

    fn open_panel(&mut self, panel: PanelType) {
        if let Some((surface, node, tab)) = self.dock_state.find_tab(&panel) {
            self.dock_state.set_active_tab((surface, node, tab));
            self.dock_state.set_focused_node_and_surface((surface, node));
        } else {
            self.dock_state.push_to_focused_leaf(panel);
        }
    }
}

/// File name for messages, falling back to the full path
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Main dashboard application
pub struct DashboardApp {
    running: Option<DashboardRunning>,
    config_path: PathBuf,
    /// Log receiver passed to the console panel on first resume
    log_rx: Option<Receiver<LogRecord>>,
    /// Startup failure reported once the event loop returns
    error: Option<DashboardError>,
}

impl DashboardApp {
    /// Create a new dashboard application
    pub fn new(config_path: PathBuf, log_rx: Option<Receiver<LogRecord>>) -> Self {
        Self {
            running: None,
            config_path,
            log_rx,
            error: None,
        }
    }

    /// Run the dashboard until its window closes
    pub fn run(config_path: PathBuf, log_rx: Option<Receiver<LogRecord>>) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = DashboardApp::new(config_path, log_rx);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<DashboardRunning> {
        tracing::info!("Creating dashboard window...");

        let window_attrs = Window::default_attributes()
            .with_title("Streali Dashboard")
            .with_inner_size(winit::dpi::LogicalSize::new(1440, 900))
            .with_min_inner_size(winit::dpi::LogicalSize::new(800, 600));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| DashboardError::WindowCreation(e.to_string()))?,
        );

        tracing::info!("Initializing graphics...");
        let graphics = GraphicsState::new(window.clone())?;

        let egui_ctx = egui::Context::default();
        let dashboard = DashboardInner::new(self.config_path.clone(), self.log_rx.take());

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024), // max texture side
        );

        tracing::info!("Dashboard initialized, window size {:?}", window.inner_size());

        Ok(DashboardRunning {
            window,
            graphics,
            egui_ctx,
            egui_state,
            dashboard,
            title: String::new(),
        })
    }
}

impl ApplicationHandler for DashboardApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                tracing::error!("{}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if running.dashboard.state.has_unsaved_changes() {
                    running.dashboard.show_unsaved_warning = true;
                    running.dashboard.pending_action.hold(Box::new(|dashboard| {
                        dashboard.request_exit = true;
                    }));
                    running.window.request_redraw();
                } else {
                    tracing::info!("Close requested, exiting...");
                    running.dashboard.shutdown();
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.graphics.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| {
                    running.dashboard.update(ctx);
                });

                if running.dashboard.request_exit {
                    running.dashboard.shutdown();
                    event_loop.exit();
                    return;
                }

                let title = running.dashboard.state.title();
                if title != running.title {
                    running.window.set_title(&title);
                    running.title = title;
                }

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());

                match running.graphics.render(&running.egui_ctx, full_output, &running.window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.graphics.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        running.dashboard.shutdown();
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                // Background channels are drained once per frame
                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_runs_after_proceed() {
        let mut deferred = Deferred::default();
        deferred.hold("exit");
        assert_eq!(deferred.proceed(), Some("exit"));
        assert_eq!(deferred.proceed(), None);
    }

    #[test]
    fn test_deferred_waits_for_save_as() {
        let mut deferred = Deferred::default();
        deferred.hold("exit");
        deferred.await_save();
        assert!(deferred.awaiting_save);

        assert_eq!(deferred.save_finished(true), Some("exit"));
        assert!(!deferred.awaiting_save);
        assert_eq!(deferred.save_finished(true), None);
    }

    #[test]
    fn test_deferred_dropped_when_save_as_fails_or_is_cancelled() {
        let mut deferred = Deferred::default();
        deferred.hold("open");
        deferred.await_save();
        assert_eq!(deferred.save_finished(false), None);
        assert_eq!(deferred.proceed(), None);

        deferred.hold("new");
        deferred.discard();
        assert_eq!(deferred.proceed(), None);
    }

    #[test]
    fn test_plain_save_as_leaves_held_action_alone() {
        let mut deferred = Deferred::default();
        deferred.hold("exit");
        assert_eq!(deferred.save_finished(true), None);
        assert_eq!(deferred.proceed(), Some("exit"));
    }
}
