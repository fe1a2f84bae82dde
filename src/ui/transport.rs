// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Transport bar: play/pause, position readout, file navigation and the
//! explicit add-keyframe button.

use crate::util::time::format_timestamp;

/// Result of transport bar interaction.
pub enum TransportAction {
    None,
    TogglePlay,
    AddKeyframe,
    PrevFile,
    NextFile,
}

/// Display the transport controls for the current media file.
pub fn show(
    ui: &mut egui::Ui,
    file_name: &str,
    paused: bool,
    position_ms: f64,
    duration_ms: Option<f64>,
) -> TransportAction {
    let mut action = TransportAction::None;

    ui.horizontal(|ui| {
        if ui.button("⏴").on_hover_text("Previous file (Left)").clicked() {
            action = TransportAction::PrevFile;
        }
        if ui.button("⏵").on_hover_text("Next file (Right)").clicked() {
            action = TransportAction::NextFile;
        }

        ui.separator();

        let play_label = if paused { "▶" } else { "⏸" };
        if ui.button(play_label).clicked() {
            action = TransportAction::TogglePlay;
        }

        let readout = match duration_ms {
            Some(duration) => format!(
                "{} / {}",
                format_timestamp(position_ms.round() as u64),
                format_timestamp(duration.round() as u64)
            ),
            None => format!("{} / –:––", format_timestamp(position_ms.round() as u64)),
        };
        ui.monospace(readout);

        ui.separator();

        let can_add = duration_ms.is_some();
        if ui
            .add_enabled(can_add, egui::Button::new("+ Keyframe"))
            .on_disabled_hover_text("Duration unknown")
            .clicked()
        {
            action = TransportAction::AddKeyframe;
        }

        ui.separator();
        ui.label(egui::RichText::new(file_name).weak());
    });

    action
}
