// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation detail panels.
//!
//! Shows the description and label tags of the selected keyframe, or of the
//! media file itself when no keyframe is selected, and hosts the label
//! autocomplete input. Purely local interaction (moving the suggestion
//! highlight, dismissing the list) mutates the panel directly; anything that
//! needs a debounce timer or a store round-trip is reported back as an
//! action.

use crate::engine::autocomplete::{match_range, KeyInput};
use crate::engine::panel::DetailPanel;
use crate::engine::timeline::Marker;
use crate::models::label::LabelId;
use crate::util::time::format_timestamp;

/// Result of detail panel interaction.
pub enum DetailAction {
    /// The description text changed; restart the autosave window.
    DescriptionEdited,
    /// The label query changed; reschedule the search.
    QueryEdited(String),
    /// Commit a label name (keyboard or pointer) to the bound target.
    CommitLabel(String),
    /// Request removal of a label tag.
    RemoveTag(LabelId),
    /// Delete the selected keyframe.
    DeleteKeyframe,
}

/// Display the detail panel for the selected keyframe.
pub fn show(ui: &mut egui::Ui, panel: &mut DetailPanel, marker: Option<&Marker>) -> Vec<DetailAction> {
    let mut actions = Vec::new();

    let Some(marker) = marker else {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new("Select a keyframe to edit its details")
                    .weak()
                    .color(egui::Color32::from_gray(150)),
            );
        });
        return actions;
    };

    ui.heading(format!("Keyframe at {}", format_timestamp(marker.timestamp_ms)));
    if marker.pinned {
        ui.label(egui::RichText::new("Pinned").weak().italics());
    }
    ui.separator();

    annotation_editor(ui, panel, &mut actions);

    if !marker.pinned {
        ui.add_space(8.0);
        if ui.button("Delete Keyframe").clicked() {
            actions.push(DetailAction::DeleteKeyframe);
        }
    }

    actions
}

/// Display the annotation panel for the media file itself, shown while no
/// keyframe is selected.
pub fn show_file(ui: &mut egui::Ui, panel: &mut DetailPanel, file_name: &str) -> Vec<DetailAction> {
    let mut actions = Vec::new();

    ui.heading("File");
    ui.label(egui::RichText::new(file_name).weak());
    ui.separator();

    annotation_editor(ui, panel, &mut actions);
    actions
}

/// Description field, tag chips and the autocomplete input. Shared between
/// the keyframe and file panels; the bound target decides where edits land.
fn annotation_editor(ui: &mut egui::Ui, panel: &mut DetailPanel, actions: &mut Vec<DetailAction>) {
    // Description with debounced autosave.
    ui.label("Description");
    let desc_response = ui.add(
        egui::TextEdit::multiline(panel.description_mut())
            .desired_rows(4)
            .desired_width(f32::INFINITY),
    );
    if desc_response.changed() {
        actions.push(DetailAction::DescriptionEdited);
    }

    ui.add_space(8.0);
    ui.label("Labels");

    // Tag collection. Tags disappear only once the store confirms the
    // detach.
    ui.horizontal_wrapped(|ui| {
        for tag in panel.autocomplete().tags().to_vec() {
            ui.group(|ui| {
                ui.label(&tag.name);
                if ui.small_button("×").clicked() {
                    actions.push(DetailAction::RemoveTag(tag.id));
                }
            });
        }
    });

    // Autocomplete input with keyboard navigation.
    let input_response = ui.add(
        egui::TextEdit::singleline(panel.autocomplete_mut().query_mut())
            .hint_text("Add label…")
            .desired_width(f32::INFINITY),
    );
    if input_response.changed() {
        actions.push(DetailAction::QueryEdited(
            panel.autocomplete().query().to_string(),
        ));
    }

    if input_response.has_focus() {
        // Claim the navigation keys so nothing else reacts to them.
        if ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::ArrowDown)) {
            panel.autocomplete_mut().handle_key(KeyInput::ArrowDown);
        }
        if ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::ArrowUp)) {
            panel.autocomplete_mut().handle_key(KeyInput::ArrowUp);
        }
    }
    // Enter and Escape both make the text edit surrender focus before this
    // code runs, so they are only observable through lost_focus.
    if input_response.lost_focus() {
        if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            if let Some(name) = panel.autocomplete_mut().handle_key(KeyInput::Enter) {
                actions.push(DetailAction::CommitLabel(name));
            }
            input_response.request_focus();
        } else if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            panel.autocomplete_mut().handle_key(KeyInput::Escape);
        }
    }

    // Suggestion list. A pointer click commits before focus loss can
    // dismiss the list, because the commit is resolved in the same frame.
    if panel.autocomplete().is_open() {
        let query = panel.autocomplete().query().to_string();
        let active = panel.autocomplete().active_index();
        let mut picked = None;

        egui::Frame::popup(ui.style()).show(ui, |ui| {
            for (i, label) in panel.autocomplete().candidates().iter().enumerate() {
                let text = suggestion_text(ui, &label.name, &query);
                if ui
                    .selectable_label(active == i as isize, text)
                    .clicked()
                {
                    picked = Some(i);
                }
            }
        });

        if let Some(index) = picked {
            if let Some(name) = panel.autocomplete().pick_candidate(index) {
                actions.push(DetailAction::CommitLabel(name));
            }
        }
    }
}

/// Candidate name with the matched substring visually distinguished.
fn suggestion_text(ui: &egui::Ui, name: &str, query: &str) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    let font = egui::TextStyle::Body.resolve(ui.style());
    let normal = egui::text::TextFormat::simple(font.clone(), ui.visuals().text_color());
    let highlighted = egui::text::TextFormat::simple(font, egui::Color32::from_rgb(230, 190, 60));

    match match_range(name, query) {
        Some((start, end)) => {
            job.append(&name[..start], 0.0, normal.clone());
            job.append(&name[start..end], 0.0, highlighted);
            job.append(&name[end..], 0.0, normal);
        }
        None => job.append(name, 0.0, normal),
    }
    job
}
