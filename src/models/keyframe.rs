// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keyframe data structures.
//!
//! A keyframe is a time-stamped marker on a media file's timeline carrying
//! a free-text description and a set of labels.

use super::label::Label;
use serde::{Deserialize, Serialize};

/// Identifier assigned to a keyframe by the library on creation.
pub type KeyframeId = i64;

/// Identifier of a media file in the library.
pub type MediaFileId = i64;

/// A labeled point in time on a video or audio file.
///
/// Labels are resolved to full [`Label`] values when a keyframe leaves the
/// store, so consumers never see raw association ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub id: KeyframeId,
    pub file_id: MediaFileId,
    pub timestamp_ms: u64,
    pub description: String,
    /// Pinned keyframes (the automatic 0:00 marker) cannot be deleted.
    pub pinned: bool,
    pub labels: Vec<Label>,
}

impl Keyframe {
    /// Create a new unpinned keyframe with no description or labels.
    pub fn new(id: KeyframeId, file_id: MediaFileId, timestamp_ms: u64) -> Self {
        Self {
            id,
            file_id,
            timestamp_ms,
            description: String::new(),
            pinned: false,
            labels: Vec::new(),
        }
    }
}
