// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timeline engine.
//!
//! Translates time to horizontal position and back, manages keyframe markers
//! and selection, and owns the scrub state machine. The engine never talks to
//! the media player or the store directly: it returns [`MediaCommand`]s and
//! store request payloads for the application shell to dispatch, and is fed
//! acknowledgments back. Markers appear and disappear only on store
//! acknowledgment; there is no optimistic mutation.
//!
//! Each marker carries a client-side cache of its description and labels so
//! that re-selecting a keyframe restores what was typed even while a save is
//! still in flight.

use crate::models::keyframe::{Keyframe, KeyframeId};
use crate::models::label::Label;
use crate::util::time::track_fraction;

/// Horizontal extent of the timeline track, in screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct TrackRect {
    pub left: f32,
    pub width: f32,
}

/// A command for the media position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCommand {
    /// Seek to an absolute position in milliseconds.
    Seek(f64),
    Pause,
    Play,
}

/// A keyframe marker on the track, with the panel cache for its detail.
#[derive(Debug, Clone)]
pub struct Marker {
    pub id: KeyframeId,
    pub timestamp_ms: u64,
    pub pinned: bool,
    pub description: String,
    pub labels: Vec<Label>,
}

impl From<Keyframe> for Marker {
    fn from(kf: Keyframe) -> Self {
        Self {
            id: kf.id,
            timestamp_ms: kf.timestamp_ms,
            pinned: kf.pinned,
            description: kf.description,
            labels: kf.labels,
        }
    }
}

/// Timeline session state for one media file.
pub struct TimelineEngine {
    duration_ms: Option<f64>,
    /// Markers in creation order; layout order is derived from timestamps.
    markers: Vec<Marker>,
    selected: Option<KeyframeId>,
    scrubbing: bool,
    was_playing_before_scrub: bool,
    /// Playhead position as a fraction of the track, when known.
    playhead: Option<f32>,
}

impl TimelineEngine {
    pub fn new() -> Self {
        Self {
            duration_ms: None,
            markers: Vec::new(),
            selected: None,
            scrubbing: false,
            was_playing_before_scrub: false,
            playhead: None,
        }
    }

    /// Reset the session for a newly opened media file.
    pub fn load(&mut self, keyframes: Vec<Keyframe>) {
        self.markers = keyframes.into_iter().map(Marker::from).collect();
        self.selected = None;
        self.scrubbing = false;
        self.was_playing_before_scrub = false;
        self.playhead = None;
    }

    // --- Media metadata and playback position ---

    /// Record the media duration once metadata is available.
    pub fn on_metadata_ready(&mut self, duration_ms: f64) {
        if duration_ms > 0.0 {
            self.duration_ms = Some(duration_ms);
        }
    }

    pub fn duration_ms(&self) -> Option<f64> {
        self.duration_ms
    }

    /// Recompute the playhead fraction from the current position. No-op while
    /// the duration is unknown; safe to call every frame.
    pub fn on_playback_tick(&mut self, current_ms: f64) {
        let Some(duration) = self.duration_ms else {
            return;
        };
        self.playhead = Some((current_ms / duration).clamp(0.0, 1.0) as f32);
    }

    pub fn playhead_fraction(&self) -> Option<f32> {
        self.playhead
    }

    // --- Geometry ---

    /// Map a pointer position to a media time, clamped to `[0, duration]`.
    pub fn time_at(&self, pointer_x: f32, track: TrackRect) -> Option<f64> {
        let duration = self.duration_ms?;
        Some(track_fraction(pointer_x, track.left, track.width) as f64 * duration)
    }

    /// Horizontal fraction of the track where a marker sits.
    pub fn marker_fraction(&self, marker: &Marker) -> Option<f32> {
        let duration = self.duration_ms?;
        Some((marker.timestamp_ms as f64 / duration).clamp(0.0, 1.0) as f32)
    }

    /// The marker under the pointer, within `radius` pixels, if any.
    pub fn hit_test(&self, pointer_x: f32, track: TrackRect, radius: f32) -> Option<KeyframeId> {
        self.markers.iter().find_map(|m| {
            let fraction = self.marker_fraction(m)?;
            let marker_x = track.left + fraction * track.width;
            ((pointer_x - marker_x).abs() <= radius).then_some(m.id)
        })
    }

    // --- Scrubbing ---

    /// Start a scrub drag on the track. Ignored while the duration is unknown
    /// or when the pointer is over a keyframe marker. Captures whether
    /// playback was running so it can be resumed at drag end.
    pub fn begin_scrub(
        &mut self,
        pointer_x: f32,
        track: TrackRect,
        playing: bool,
        marker_radius: f32,
    ) -> Vec<MediaCommand> {
        if self.duration_ms.is_none() {
            return Vec::new();
        }
        if self.hit_test(pointer_x, track, marker_radius).is_some() {
            return Vec::new();
        }

        self.scrubbing = true;
        self.was_playing_before_scrub = playing;

        let mut commands = vec![MediaCommand::Pause];
        if let Some(cmd) = self.scrub_seek(pointer_x, track) {
            commands.push(cmd);
        }
        commands
    }

    /// Continue an active scrub: an idempotent function of pointer position.
    pub fn scrub_to(&mut self, pointer_x: f32, track: TrackRect) -> Option<MediaCommand> {
        if !self.scrubbing {
            return None;
        }
        self.scrub_seek(pointer_x, track)
    }

    /// End the scrub drag; resume playback iff it was running at drag start.
    pub fn end_scrub(&mut self) -> Option<MediaCommand> {
        if !self.scrubbing {
            return None;
        }
        self.scrubbing = false;
        self.was_playing_before_scrub.then_some(MediaCommand::Play)
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    fn scrub_seek(&mut self, pointer_x: f32, track: TrackRect) -> Option<MediaCommand> {
        let time = self.time_at(pointer_x, track)?;
        self.on_playback_tick(time);
        Some(MediaCommand::Seek(time))
    }

    // --- Keyframe creation ---

    /// Timestamp for a keyframe at the current playback position, clamped to
    /// the media duration. `None` while the duration is unknown.
    pub fn add_at_time(&self, current_ms: f64) -> Option<u64> {
        let duration = self.duration_ms?;
        Some(current_ms.clamp(0.0, duration).round() as u64)
    }

    /// Timestamp for a keyframe at a pointer position on the track. Rejected
    /// while scrubbing, so drag gestures never create keyframes.
    pub fn add_at_pointer(&self, pointer_x: f32, track: TrackRect) -> Option<u64> {
        if self.scrubbing {
            return None;
        }
        Some(self.time_at(pointer_x, track)?.round() as u64)
    }

    /// Insert a keyframe acknowledged by the store.
    pub fn insert_acknowledged(&mut self, keyframe: Keyframe) -> KeyframeId {
        let id = keyframe.id;
        self.markers.push(Marker::from(keyframe));
        id
    }

    // --- Selection ---

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: KeyframeId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn selected_id(&self) -> Option<KeyframeId> {
        self.selected
    }

    pub fn selected_marker(&self) -> Option<&Marker> {
        self.selected.and_then(|id| self.marker(id))
    }

    /// The keyframe to auto-select when none is selected: earliest timestamp,
    /// ties broken by creation order.
    pub fn auto_select_candidate(&self) -> Option<KeyframeId> {
        if self.selected.is_some() {
            return None;
        }
        self.markers.iter().min_by_key(|m| m.timestamp_ms).map(|m| m.id)
    }

    /// Mark a keyframe as selected. Returns false if it is not in the layout.
    pub fn set_selected(&mut self, id: KeyframeId) -> bool {
        if self.marker(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// Flush locally buffered panel edits into a marker's cache so they can
    /// be restored when the keyframe is re-selected.
    pub fn cache_panel_state(&mut self, id: KeyframeId, description: String, labels: Vec<Label>) {
        if let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) {
            marker.description = description;
            marker.labels = labels;
        }
    }

    // --- Deletion ---

    /// The delete request for the current selection, or `None` if nothing is
    /// selected or the selected keyframe is pinned.
    pub fn delete_selected(&self) -> Option<KeyframeId> {
        let marker = self.selected_marker()?;
        (!marker.pinned).then_some(marker.id)
    }

    /// Apply a store-acknowledged delete: drop the marker and clear the
    /// selection if it pointed at the deleted keyframe.
    pub fn confirm_deleted(&mut self, id: KeyframeId) {
        self.markers.retain(|m| m.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }
}

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new()
    }
}
