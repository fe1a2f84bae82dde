// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Debounced field persister.
//!
//! Turns "save on every keystroke" into "save once input goes idle". The
//! persister is keyframe-agnostic: it tracks one bound target id and one
//! pending deadline, and reports when a save should fire. The caller supplies
//! the current time on every call so the debounce window is deterministic
//! under test.

use crate::models::keyframe::KeyframeId;
use std::time::{Duration, Instant};

/// Idle window after the last edit before a save fires.
pub const SAVE_IDLE: Duration = Duration::from_millis(500);

/// Schedules at most one pending save for the currently bound target.
pub struct FieldPersister {
    target: Option<KeyframeId>,
    deadline: Option<Instant>,
    idle: Duration,
}

impl FieldPersister {
    pub fn new() -> Self {
        Self::with_idle(SAVE_IDLE)
    }

    pub fn with_idle(idle: Duration) -> Self {
        Self {
            target: None,
            deadline: None,
            idle,
        }
    }

    /// Record an edit: cancel any pending save and schedule a new one.
    pub fn on_edit(&mut self, now: Instant) {
        self.deadline = Some(now + self.idle);
    }

    /// Repoint future saves at a new target. Any pending save for the old
    /// target is cancelled; the caller must have flushed prior edits already.
    pub fn rebind(&mut self, target: Option<KeyframeId>) {
        self.deadline = None;
        self.target = target;
    }

    /// Cancel any pending save. Must be called on teardown so the timer never
    /// fires after the owning panel is gone.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn target(&self) -> Option<KeyframeId> {
        self.target
    }

    /// Whether a save is scheduled but has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire the pending save if its idle window has elapsed, returning the
    /// target id captured now. Fires at most once per scheduled window; a
    /// missing target silently swallows the save.
    pub fn poll(&mut self, now: Instant) -> Option<KeyframeId> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.target
    }
}

impl Default for FieldPersister {
    fn default() -> Self {
        Self::new()
    }
}
