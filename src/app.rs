// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module wires the interaction engines, the playback clock and the
//! background store together. All engine mutations funnel through the
//! handlers below; the UI modules only render state and report actions.

use crate::engine::panel::DetailPanel;
use crate::engine::timeline::{MediaCommand, TimelineEngine, TrackRect};
use crate::io::playback::MediaClock;
use crate::io::{media, scanner, serialization};
use crate::models::keyframe::KeyframeId;
use crate::models::library::{Library, MediaFile, MediaType};
use crate::store::{AnnotationScope, ExportFormat, StoreHandle, StoreRequest, StoreResponse};
use crate::ui::detail::{self, DetailAction};
use crate::ui::timeline::{self, TimelineAction, MARKER_RADIUS};
use crate::ui::transport::{self, TransportAction};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

/// Result of background library loading.
struct LoadedLibrary {
    root: PathBuf,
    library: Library,
}

/// Main application state.
pub struct KeymarkApp {
    /// Root folder of the open media library.
    media_root: Option<PathBuf>,

    /// Media files known to the library, in scan order.
    files: Vec<MediaFile>,

    /// Index into `files` of the file being annotated.
    current_file: Option<usize>,

    /// Handle to the background annotation store.
    store: Option<StoreHandle>,

    /// Timeline state for the current file.
    engine: TimelineEngine,

    /// Detail panel bound to the selected keyframe.
    panel: DetailPanel,

    /// Annotation panel bound to the current media file itself.
    file_panel: DetailPanel,

    /// Simulated media playback position source.
    clock: MediaClock,

    /// Receiver for background library loading.
    library_loader: Option<Receiver<Result<LoadedLibrary, String>>>,

    /// Loading state message.
    loading_message: Option<String>,
}

impl Default for KeymarkApp {
    fn default() -> Self {
        Self::new()
    }
}

impl KeymarkApp {
    /// Create a new Keymark application instance.
    pub fn new() -> Self {
        Self {
            media_root: None,
            files: Vec::new(),
            current_file: None,
            store: None,
            engine: TimelineEngine::new(),
            panel: DetailPanel::new(),
            file_panel: DetailPanel::new(),
            clock: MediaClock::new(),
            library_loader: None,
            loading_message: None,
        }
    }

    /// Scan a media folder and load its annotation library (asynchronously).
    fn open_media_folder(&mut self, root: PathBuf) {
        let (sender, receiver) = channel();
        self.library_loader = Some(receiver);
        self.loading_message = Some("Scanning media folder...".to_string());

        std::thread::spawn(move || {
            let result = (|| -> Result<LoadedLibrary, String> {
                let scanned = scanner::scan(&root)
                    .map_err(|e| format!("Failed to scan {}: {}", root.display(), e))?;

                let mut library = serialization::load_or_new(&root);
                for file in scanned {
                    let duration = match media::probe_duration_ms(&root.join(&file.path)) {
                        Ok(duration) => duration,
                        Err(e) => {
                            log::warn!("Could not probe {}: {}", file.path, e);
                            None
                        }
                    };
                    library.register_file(file.path, file.media_type, duration);
                }

                serialization::save_library(&library, &root)
                    .map_err(|e| format!("Failed to save library: {}", e))?;

                log::info!(
                    "Opened media folder {} with {} files",
                    root.display(),
                    library.files.len()
                );
                Ok(LoadedLibrary { root, library })
            })();

            let _ = sender.send(result);
        });
    }

    /// Install a freshly loaded library and open its first file.
    fn install_library(&mut self, loaded: LoadedLibrary) {
        self.files = loaded.library.files.clone();
        self.store = Some(StoreHandle::spawn(loaded.library, loaded.root.clone()));
        self.media_root = Some(loaded.root);
        self.current_file = None;
        self.engine = TimelineEngine::new();
        self.panel.clear();
        self.file_panel.clear();

        if !self.files.is_empty() {
            self.open_file(0);
        }
    }

    /// Switch to the media file at `index`.
    fn open_file(&mut self, index: usize) {
        let Some(file) = self.files.get(index) else {
            return;
        };
        let file_id = file.id;
        let duration = file.duration_ms;

        self.current_file = Some(index);
        self.panel.cancel_timers();
        self.panel.clear();
        self.file_panel.cancel_timers();
        self.file_panel.clear();
        self.engine = TimelineEngine::new();
        self.clock.load(duration);
        if let Some(duration) = duration {
            self.engine.on_metadata_ready(duration as f64);
        } else {
            log::warn!("Duration unknown for file {}; timeline disabled", file_id);
        }

        if let Some(store) = &self.store {
            store.send(StoreRequest::OpenFile { file_id });
        }
    }

    fn open_adjacent_file(&mut self, step: isize) {
        let Some(current) = self.current_file else {
            return;
        };
        let target = current as isize + step;
        if target < 0 || target as usize >= self.files.len() {
            return;
        }
        self.open_file(target as usize);
    }

    /// Run the full selection-switch flow: flush the outgoing keyframe's
    /// panel edits into its cache, then bind the panel to the new keyframe
    /// and repopulate it from that keyframe's cache.
    fn select_keyframe(&mut self, id: KeyframeId, now: Instant) {
        if let Some(previous) = self.engine.selected_id() {
            if previous != id {
                let (description, labels) = self.panel.snapshot();
                self.engine.cache_panel_state(previous, description, labels);
            }
        }

        let Some(marker) = self.engine.marker(id) else {
            return;
        };
        let timestamp_ms = marker.timestamp_ms;
        let description = marker.description.clone();
        let labels = marker.labels.clone();

        self.engine.set_selected(id);
        self.panel.bind(id, description, labels);

        // Jump playback to the keyframe.
        self.apply_media_command(MediaCommand::Seek(timestamp_ms as f64), now);
        log::info!("Selected keyframe {}", id);
    }

    fn apply_media_command(&mut self, command: MediaCommand, now: Instant) {
        match command {
            MediaCommand::Seek(ms) => {
                self.clock.seek(ms, now);
                let position = self.clock.position_ms(now);
                self.engine.on_playback_tick(position);
            }
            MediaCommand::Pause => self.clock.pause(now),
            MediaCommand::Play => self.clock.play(now),
        }
    }

    fn send_store(&self, request: StoreRequest) {
        if let Some(store) = &self.store {
            store.send(request);
        }
    }

    fn current_file_id(&self) -> Option<i64> {
        self.current_file.map(|i| self.files[i].id)
    }

    fn handle_store_response(&mut self, response: StoreResponse, now: Instant) {
        match response {
            StoreResponse::FileOpened {
                file_id,
                description,
                labels,
                keyframes,
            } => {
                if self.current_file_id() != Some(file_id) {
                    return;
                }
                self.file_panel.bind(file_id, description, labels);
                self.engine.load(keyframes);
                if let Some(id) = self.engine.auto_select_candidate() {
                    self.select_keyframe(id, now);
                }
            }
            StoreResponse::KeyframeCreated(keyframe) => {
                if self.current_file_id() != Some(keyframe.file_id) {
                    return;
                }
                let id = self.engine.insert_acknowledged(keyframe);
                log::info!("Added keyframe {}, total: {}", id, self.engine.markers().len());
                self.select_keyframe(id, now);
            }
            StoreResponse::KeyframeDeleted { id } => {
                self.engine.confirm_deleted(id);
                if self.panel.bound() == Some(id) {
                    self.panel.clear();
                }
                log::info!("Deleted keyframe {}, total: {}", id, self.engine.markers().len());
            }
            StoreResponse::SearchResults {
                generation,
                scope,
                labels,
            } => {
                let panel = match scope {
                    AnnotationScope::Keyframe => &mut self.panel,
                    AnnotationScope::File => &mut self.file_panel,
                };
                panel.autocomplete_mut().on_search_results(generation, labels);
            }
            StoreResponse::LabelAttached { keyframe_id, label } => {
                self.panel.autocomplete_mut().on_attached(keyframe_id, label);
            }
            StoreResponse::LabelDetached {
                keyframe_id,
                label_id,
            } => {
                self.panel
                    .autocomplete_mut()
                    .on_detached(keyframe_id, label_id);
            }
            StoreResponse::FileLabelAttached { file_id, label } => {
                self.file_panel.autocomplete_mut().on_attached(file_id, label);
            }
            StoreResponse::FileLabelDetached { file_id, label_id } => {
                self.file_panel
                    .autocomplete_mut()
                    .on_detached(file_id, label_id);
            }
            StoreResponse::Exported { path } => {
                log::info!("Exported annotations to {}", path.display());
            }
            StoreResponse::Failure { op, message } => {
                // Prior state is untouched; nothing to roll back.
                log::error!("Store request failed ({}): {}", op, message);
            }
        }
    }

    fn handle_timeline_action(&mut self, action: TimelineAction, track: TrackRect, now: Instant) {
        match action {
            TimelineAction::None => {}
            TimelineAction::ClickAt(x) => {
                // A bare click is a degenerate scrub: seek once, keep the
                // play state.
                let playing = !self.clock.is_paused();
                let commands = self.engine.begin_scrub(x, track, playing, MARKER_RADIUS);
                for command in commands {
                    self.apply_media_command(command, now);
                }
                if let Some(command) = self.engine.end_scrub() {
                    self.apply_media_command(command, now);
                }
            }
            TimelineAction::BeginScrub(x) => {
                let playing = !self.clock.is_paused();
                let commands = self.engine.begin_scrub(x, track, playing, MARKER_RADIUS);
                for command in commands {
                    self.apply_media_command(command, now);
                }
            }
            TimelineAction::ScrubTo(x) => {
                if let Some(command) = self.engine.scrub_to(x, track) {
                    self.apply_media_command(command, now);
                }
            }
            TimelineAction::EndScrub => {
                if let Some(command) = self.engine.end_scrub() {
                    self.apply_media_command(command, now);
                }
            }
            TimelineAction::SelectKeyframe(id) => {
                self.select_keyframe(id, now);
            }
            TimelineAction::AddAtPointer(x) => {
                if let (Some(file_id), Some(timestamp_ms)) =
                    (self.current_file_id(), self.engine.add_at_pointer(x, track))
                {
                    self.send_store(StoreRequest::CreateKeyframe {
                        file_id,
                        timestamp_ms,
                    });
                }
            }
        }
    }

    fn handle_transport_action(&mut self, action: TransportAction, now: Instant) {
        match action {
            TransportAction::None => {}
            TransportAction::TogglePlay => {
                if self.clock.is_paused() {
                    self.clock.play(now);
                } else {
                    self.clock.pause(now);
                }
            }
            TransportAction::AddKeyframe => {
                let position = self.clock.position_ms(now);
                if let (Some(file_id), Some(timestamp_ms)) =
                    (self.current_file_id(), self.engine.add_at_time(position))
                {
                    self.send_store(StoreRequest::CreateKeyframe {
                        file_id,
                        timestamp_ms,
                    });
                }
            }
            TransportAction::PrevFile => self.open_adjacent_file(-1),
            TransportAction::NextFile => self.open_adjacent_file(1),
        }
    }

    fn handle_detail_action(&mut self, action: DetailAction, now: Instant) {
        match action {
            DetailAction::DescriptionEdited => {
                self.panel.on_description_edit(now);
            }
            DetailAction::QueryEdited(text) => {
                self.panel.autocomplete_mut().on_query_change(&text, now);
            }
            DetailAction::CommitLabel(name) => {
                if let Some((keyframe_id, name)) = self.panel.autocomplete().commit(&name) {
                    self.send_store(StoreRequest::AttachLabel { keyframe_id, name });
                }
            }
            DetailAction::RemoveTag(label_id) => {
                if let Some((keyframe_id, label_id)) =
                    self.panel.autocomplete().remove_tag(label_id)
                {
                    self.send_store(StoreRequest::DetachLabel {
                        keyframe_id,
                        label_id,
                    });
                }
            }
            DetailAction::DeleteKeyframe => {
                if let Some(id) = self.engine.delete_selected() {
                    self.send_store(StoreRequest::DeleteKeyframe { id });
                }
            }
        }
    }

    /// Same panel actions as [`Self::handle_detail_action`], but applied to
    /// the media file's own annotations.
    fn handle_file_detail_action(&mut self, action: DetailAction, now: Instant) {
        match action {
            DetailAction::DescriptionEdited => {
                self.file_panel.on_description_edit(now);
            }
            DetailAction::QueryEdited(text) => {
                self.file_panel.autocomplete_mut().on_query_change(&text, now);
            }
            DetailAction::CommitLabel(name) => {
                if let Some((file_id, name)) = self.file_panel.autocomplete().commit(&name) {
                    self.send_store(StoreRequest::AttachFileLabel { file_id, name });
                }
            }
            DetailAction::RemoveTag(label_id) => {
                if let Some((file_id, label_id)) =
                    self.file_panel.autocomplete().remove_tag(label_id)
                {
                    self.send_store(StoreRequest::DetachFileLabel { file_id, label_id });
                }
            }
            // Files are deleted from disk, not from here.
            DetailAction::DeleteKeyframe => {}
        }
    }

    fn export_annotations(&self, format: ExportFormat) {
        let Some(file_id) = self.current_file_id() else {
            return;
        };
        let (extensions, default_name) = match format {
            ExportFormat::Yaml => (&["yaml", "yml"][..], "annotations.yaml"),
            ExportFormat::Json => (&["json"][..], "annotations.json"),
        };
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Annotations", extensions)
            .set_file_name(default_name)
            .save_file()
        {
            self.send_store(StoreRequest::Export {
                file_id,
                path,
                format,
            });
        }
    }

    /// Drain pending background results: the library loader, the store
    /// responses and the due debounce timers.
    fn poll_background(&mut self, now: Instant) {
        if let Some(receiver) = &self.library_loader {
            if let Ok(result) = receiver.try_recv() {
                self.library_loader = None;
                self.loading_message = None;
                match result {
                    Ok(loaded) => self.install_library(loaded),
                    Err(e) => log::error!("Failed to open media folder: {}", e),
                }
            }
        }

        loop {
            let response = match &self.store {
                Some(store) => store.try_recv(),
                None => None,
            };
            let Some(response) = response else {
                break;
            };
            self.handle_store_response(response, now);
        }

        if let Some((id, text)) = self.panel.poll_save(now) {
            self.send_store(StoreRequest::SaveDescription { id, text });
        }
        if let Some(request) = self.panel.autocomplete_mut().poll_search(now) {
            self.send_store(StoreRequest::SearchLabels {
                query: request.query,
                generation: request.generation,
                scope: AnnotationScope::Keyframe,
            });
        }
        if let Some((id, text)) = self.file_panel.poll_save(now) {
            self.send_store(StoreRequest::SaveFileDescription { id, text });
        }
        if let Some(request) = self.file_panel.autocomplete_mut().poll_search(now) {
            self.send_store(StoreRequest::SearchLabels {
                query: request.query,
                generation: request.generation,
                scope: AnnotationScope::File,
            });
        }
    }
}

impl eframe::App for KeymarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_background(now);

        // Advance the playhead from the playback clock.
        let position = self.clock.position_ms(now);
        self.engine.on_playback_tick(position);
        let awaiting_store = self
            .store
            .as_ref()
            .is_some_and(|store| store.has_in_flight());
        if !self.clock.is_paused() || self.loading_message.is_some() {
            ctx.request_repaint();
        } else if awaiting_store {
            // Keep polling so acknowledgments are applied without waiting
            // for the next input event.
            ctx.request_repaint_after(Duration::from_millis(16));
        } else if self.panel.has_pending_timers() || self.file_panel.has_pending_timers() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Media Folder...").clicked() {
                        if let Some(path) = rfd::FileDialog::new().pick_folder() {
                            self.open_media_folder(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    let can_export = self.current_file.is_some();
                    ui.menu_button("Export Annotations", |ui| {
                        if ui
                            .add_enabled(can_export, egui::Button::new("Export as YAML..."))
                            .clicked()
                        {
                            self.export_annotations(ExportFormat::Yaml);
                            ui.close_menu();
                        }
                        if ui
                            .add_enabled(can_export, egui::Button::new("Export as JSON..."))
                            .clicked()
                        {
                            self.export_annotations(ExportFormat::Json);
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Transport bar
        if let Some(index) = self.current_file {
            let file_name = self.files[index].path.clone();
            let paused = self.clock.is_paused();
            let duration = self.clock.duration_ms();
            let transport_action = egui::TopBottomPanel::top("transport")
                .show(ctx, |ui| {
                    transport::show(ui, &file_name, paused, position, duration)
                })
                .inner;
            self.handle_transport_action(transport_action, now);
        }

        // Timeline track (bottom)
        if self.current_file.is_some() {
            let (timeline_action, track) = egui::TopBottomPanel::bottom("timeline")
                .show(ctx, |ui| {
                    ui.add_space(MARKER_RADIUS);
                    let result = timeline::show(ui, &self.engine);
                    ui.add_space(MARKER_RADIUS);
                    result
                })
                .inner;
            self.handle_timeline_action(timeline_action, track, now);
        }

        // Detail panel (right side): the file's own annotations on top, the
        // selected keyframe's below.
        if let Some(index) = self.current_file {
            let file_name = self.files[index].path.clone();
            let (file_actions, keyframe_actions) = egui::SidePanel::right("detail")
                .default_width(280.0)
                .show(ctx, |ui| {
                    let file_actions = detail::show_file(ui, &mut self.file_panel, &file_name);
                    let keyframe_actions = if self.panel.is_visible() {
                        ui.add_space(12.0);
                        ui.separator();
                        detail::show(ui, &mut self.panel, self.engine.selected_marker())
                    } else {
                        Vec::new()
                    };
                    (file_actions, keyframe_actions)
                })
                .inner;
            for action in file_actions {
                self.handle_file_detail_action(action, now);
            }
            for action in keyframe_actions {
                self.handle_detail_action(action, now);
            }
        }

        // Keyboard navigation between files, suppressed while typing.
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
                self.open_adjacent_file(-1);
            }
            if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
                self.open_adjacent_file(1);
            }
            if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
                self.handle_transport_action(TransportAction::TogglePlay, now);
            }
            if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace))
            {
                self.handle_detail_action(DetailAction::DeleteKeyframe, now);
            }
        }

        // File library (center)
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(ref message) = self.loading_message {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.spinner();
                        ui.add_space(10.0);
                        ui.label(
                            egui::RichText::new(message)
                                .size(16.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                    });
                });
                return;
            }

            if self.files.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.heading(
                            egui::RichText::new("Keymark")
                                .size(32.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                        ui.label(
                            egui::RichText::new("Keyframe marking and labeling for media files")
                                .size(14.0)
                                .color(egui::Color32::from_gray(150)),
                        );
                        ui.add_space(20.0);
                        ui.label(
                            egui::RichText::new("Open a media folder to begin annotating")
                                .color(egui::Color32::from_gray(180)),
                        );
                        ui.add_space(10.0);
                        ui.label(
                            egui::RichText::new("File → Open Media Folder...")
                                .weak()
                                .color(egui::Color32::from_gray(130)),
                        );
                    });
                });
                return;
            }

            ui.heading("Media Files");
            ui.separator();
            let mut clicked = None;
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (i, file) in self.files.iter().enumerate() {
                    let selected = self.current_file == Some(i);
                    let kind = match file.media_type {
                        MediaType::Video => "🎬",
                        MediaType::Audio => "🎵",
                    };
                    if ui
                        .selectable_label(selected, format!("{} {}", kind, file.path))
                        .clicked()
                    {
                        clicked = Some(i);
                    }
                }
            });
            if let Some(index) = clicked {
                self.open_file(index);
            }
        });
    }
}
