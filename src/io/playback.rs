// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Simulated media playback clock.
//!
//! The media position source for the timeline: advances in real time while
//! playing, accepts seek/pause/play, and stops at the media duration. The
//! current time is passed in on every call so the clock is deterministic
//! under test.

use std::time::Instant;

pub struct MediaClock {
    duration_ms: Option<f64>,
    /// Position at the last state change, in milliseconds.
    position_ms: f64,
    /// Set while playing; elapsed wall time since then is added to position.
    playing_since: Option<Instant>,
}

impl MediaClock {
    pub fn new() -> Self {
        Self {
            duration_ms: None,
            position_ms: 0.0,
            playing_since: None,
        }
    }

    /// Reset the clock for a newly opened media file.
    pub fn load(&mut self, duration_ms: Option<u64>) {
        self.duration_ms = duration_ms.map(|ms| ms as f64);
        self.position_ms = 0.0;
        self.playing_since = None;
    }

    pub fn duration_ms(&self) -> Option<f64> {
        self.duration_ms
    }

    pub fn is_paused(&self) -> bool {
        self.playing_since.is_none()
    }

    /// Current playback position. Settles the clock: reaching the end of the
    /// media pauses it there.
    pub fn position_ms(&mut self, now: Instant) -> f64 {
        if let Some(since) = self.playing_since {
            self.position_ms += now.duration_since(since).as_secs_f64() * 1000.0;
            self.playing_since = Some(now);
            if let Some(duration) = self.duration_ms {
                if self.position_ms >= duration {
                    self.position_ms = duration;
                    self.playing_since = None;
                }
            }
        }
        self.position_ms
    }

    pub fn play(&mut self, now: Instant) {
        if self.playing_since.is_some() {
            return;
        }
        // Restart from the top when playing again at the end.
        if let Some(duration) = self.duration_ms {
            if self.position_ms >= duration {
                self.position_ms = 0.0;
            }
        }
        self.playing_since = Some(now);
    }

    pub fn pause(&mut self, now: Instant) {
        self.position_ms(now);
        self.playing_since = None;
    }

    pub fn seek(&mut self, ms: f64, now: Instant) {
        let target = match self.duration_ms {
            Some(duration) => ms.clamp(0.0, duration),
            None => ms.max(0.0),
        };
        self.position_ms = target;
        if self.playing_since.is_some() {
            self.playing_since = Some(now);
        }
    }
}

impl Default for MediaClock {
    fn default() -> Self {
        Self::new()
    }
}
