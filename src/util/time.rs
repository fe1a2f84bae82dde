// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Time utility functions.
//!
//! This module provides utilities for mapping between pointer positions and
//! media timestamps, and for formatting timestamps for display.

/// Clamp a horizontal pointer position to a `[0.0, 1.0]` fraction of a track.
///
/// Positions left of the track map to 0.0, positions past its right edge map
/// to 1.0. A degenerate track (zero or negative width) always maps to 0.0.
pub fn track_fraction(pointer_x: f32, track_left: f32, track_width: f32) -> f32 {
    if track_width <= 0.0 {
        return 0.0;
    }
    ((pointer_x - track_left) / track_width).clamp(0.0, 1.0)
}

/// Format a millisecond timestamp as `m:ss.mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let total_sec = ms / 1000;
    let min = total_sec / 60;
    let sec = total_sec % 60;
    let ms_remain = ms % 1000;
    format!("{}:{:02}.{:03}", min, sec, ms_remain)
}
