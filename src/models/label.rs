// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label data structures.
//!
//! Labels are shared, global entities looked up by prefix search.
//! Attaching a label to a keyframe is an association, not a copy.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a label by the library on creation.
pub type LabelId = i64;

/// A reusable tag that can be attached to keyframes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
}

impl Label {
    /// Create a label with the given id and display name.
    pub fn new(id: LabelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
