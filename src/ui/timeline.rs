// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timeline track widget.
//!
//! Renders the track, the playhead and the keyframe markers, and reports
//! pointer gestures back to the application as actions. All timeline state
//! lives in the [`TimelineEngine`]; this module only draws it and translates
//! egui pointer events.

use crate::engine::timeline::{TimelineEngine, TrackRect};
use crate::models::keyframe::KeyframeId;
use crate::util::time::format_timestamp;

/// Pixel radius of a keyframe marker dot.
pub const MARKER_RADIUS: f32 = 6.0;

const TRACK_HEIGHT: f32 = 28.0;

/// Result of timeline interaction.
pub enum TimelineAction {
    None,
    /// A press-release on the track without a drag: seek once.
    ClickAt(f32),
    BeginScrub(f32),
    ScrubTo(f32),
    EndScrub,
    SelectKeyframe(KeyframeId),
    /// Double-click on empty track: create a keyframe at the pointer.
    AddAtPointer(f32),
}

/// Display the timeline track and handle pointer interactions.
pub fn show(ui: &mut egui::Ui, engine: &TimelineEngine) -> (TimelineAction, TrackRect) {
    let mut action = TimelineAction::None;

    let width = ui.available_width();
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(width, TRACK_HEIGHT),
        egui::Sense::click_and_drag(),
    );
    let track = TrackRect {
        left: rect.left(),
        width: rect.width(),
    };

    let painter = ui.painter_at(rect.expand(MARKER_RADIUS));
    let track_color = if engine.duration_ms().is_some() {
        egui::Color32::from_gray(60)
    } else {
        egui::Color32::from_gray(40)
    };
    painter.rect_filled(rect, 4.0, track_color);

    // Playhead.
    if let Some(fraction) = engine.playhead_fraction() {
        let x = rect.left() + fraction * rect.width();
        painter.line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            egui::Stroke::new(2.0, egui::Color32::from_rgb(220, 60, 60)),
        );
    }

    // Keyframe markers. Overlapping markers simply draw on top of one
    // another.
    let center_y = rect.center().y;
    for marker in engine.markers() {
        let Some(fraction) = engine.marker_fraction(marker) else {
            continue;
        };
        let center = egui::pos2(rect.left() + fraction * rect.width(), center_y);

        let selected = engine.selected_id() == Some(marker.id);
        let fill = if marker.pinned {
            egui::Color32::from_rgb(130, 130, 190)
        } else {
            egui::Color32::from_rgb(230, 190, 60)
        };
        painter.circle_filled(center, MARKER_RADIUS, fill);
        if selected {
            painter.circle_stroke(center, MARKER_RADIUS + 1.5, egui::Stroke::new(2.0, egui::Color32::WHITE));
        } else {
            painter.circle_stroke(center, MARKER_RADIUS, egui::Stroke::new(1.0, egui::Color32::BLACK));
        }

        let marker_rect = egui::Rect::from_center_size(
            center,
            egui::vec2(MARKER_RADIUS * 2.0, MARKER_RADIUS * 2.0),
        );
        let marker_response = ui.interact(
            marker_rect,
            ui.id().with(("keyframe", marker.id)),
            egui::Sense::click(),
        );
        if marker_response.clicked() {
            action = TimelineAction::SelectKeyframe(marker.id);
        }
        marker_response.on_hover_text(format_timestamp(marker.timestamp_ms));
    }

    // Track gestures. Marker clicks were claimed above, so these only see
    // the bare track. egui keeps delivering drag events while the pointer is
    // outside the rect, which is exactly the global-listener behavior an
    // active scrub needs.
    if matches!(action, TimelineAction::None) {
        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                action = TimelineAction::AddAtPointer(pos.x);
            }
        } else if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                action = TimelineAction::BeginScrub(pos.x);
            }
        } else if response.dragged() {
            if let Some(pos) = response.ctx.pointer_interact_pos() {
                action = TimelineAction::ScrubTo(pos.x);
            }
        } else if response.drag_stopped() {
            action = TimelineAction::EndScrub;
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                action = TimelineAction::ClickAt(pos.x);
            }
        }
    }

    (action, track)
}
