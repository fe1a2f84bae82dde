// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label autocomplete engine.
//!
//! Prefix search with a debounce window, keyboard-driven candidate selection,
//! and a duplicate-free tag collection. The engine is keyframe-agnostic: it is
//! bound to a target id by the detail panel and stamps that id on every
//! attach/detach request it produces.
//!
//! Search responses are matched against a generation counter so a slow, stale
//! search can never overwrite the results of a newer one.

use crate::models::keyframe::KeyframeId;
use crate::models::label::{Label, LabelId};
use std::time::{Duration, Instant};

/// Idle window after the last keystroke before a search fires.
pub const SEARCH_IDLE: Duration = Duration::from_millis(200);

/// Keys the engine handles inside the label input. The UI must consume these
/// so they never reach the surrounding widget tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Enter,
    ArrowDown,
    ArrowUp,
    Escape,
}

/// A search request ready to be dispatched to the label store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub generation: u64,
}

pub struct LabelAutocomplete {
    target: Option<KeyframeId>,
    query: String,
    candidates: Vec<Label>,
    /// -1 means no highlighted candidate, else an index into `candidates`.
    active_index: isize,
    deadline: Option<Instant>,
    /// Bumped on every query change and clear; responses carrying an older
    /// generation are discarded.
    generation: u64,
    tags: Vec<Label>,
    idle: Duration,
}

impl LabelAutocomplete {
    pub fn new() -> Self {
        Self::with_idle(SEARCH_IDLE)
    }

    pub fn with_idle(idle: Duration) -> Self {
        Self {
            target: None,
            query: String::new(),
            candidates: Vec::new(),
            active_index: -1,
            deadline: None,
            generation: 0,
            tags: Vec::new(),
            idle,
        }
    }

    pub fn target(&self) -> Option<KeyframeId> {
        self.target
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut String {
        &mut self.query
    }

    pub fn candidates(&self) -> &[Label] {
        &self.candidates
    }

    pub fn active_index(&self) -> isize {
        self.active_index
    }

    pub fn tags(&self) -> &[Label] {
        &self.tags
    }

    /// Whether the suggestion list should be visible.
    pub fn is_open(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// Whether a search is scheduled but has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Record a query edit. An empty (trimmed) query clears the suggestion
    /// list immediately, without a debounce; anything else reschedules the
    /// search window.
    pub fn on_query_change(&mut self, text: &str, now: Instant) {
        self.query = text.to_string();
        self.generation += 1;
        if self.query.trim().is_empty() {
            self.deadline = None;
            self.clear_candidates();
        } else {
            self.deadline = Some(now + self.idle);
        }
    }

    /// Fire the pending search if its idle window has elapsed.
    pub fn poll_search(&mut self, now: Instant) -> Option<SearchRequest> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return None;
        }
        Some(SearchRequest {
            query,
            generation: self.generation,
        })
    }

    /// Apply a search response. Replaces candidates wholesale and resets the
    /// highlight, unless the response is stale (the query changed after the
    /// request was dispatched).
    pub fn on_search_results(&mut self, generation: u64, labels: Vec<Label>) {
        if generation != self.generation || self.query.trim().is_empty() {
            return;
        }
        self.candidates = labels;
        self.active_index = -1;
    }

    /// Move the highlight up or down, clamped to `[-1, len - 1]`.
    pub fn move_active(&mut self, direction: isize) {
        if self.candidates.is_empty() {
            return;
        }
        let max = self.candidates.len() as isize - 1;
        self.active_index = (self.active_index + direction).clamp(-1, max);
    }

    /// Handle a key press inside the label input. Returns the label name to
    /// commit, if the key produced one.
    pub fn handle_key(&mut self, key: KeyInput) -> Option<String> {
        match key {
            KeyInput::Enter => {
                if self.active_index >= 0 && (self.active_index as usize) < self.candidates.len() {
                    Some(self.candidates[self.active_index as usize].name.clone())
                } else {
                    let raw = self.query.trim();
                    if raw.is_empty() {
                        None
                    } else {
                        Some(raw.to_string())
                    }
                }
            }
            KeyInput::ArrowDown => {
                self.move_active(1);
                None
            }
            KeyInput::ArrowUp => {
                self.move_active(-1);
                None
            }
            KeyInput::Escape => {
                self.dismiss();
                None
            }
        }
    }

    /// Pointer selection of a candidate. Returns the name to commit.
    pub fn pick_candidate(&self, index: usize) -> Option<String> {
        self.candidates.get(index).map(|l| l.name.clone())
    }

    /// Produce an attach request for the bound target. The target id is
    /// captured here, so a later rebind cannot redirect the request.
    pub fn commit(&self, name: &str) -> Option<(KeyframeId, String)> {
        let target = self.target?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((target, name.to_string()))
    }

    /// Apply a successful attach: append the tag (idempotent), clear the
    /// query and hide the suggestion list. Acks for a previously bound
    /// target are ignored.
    pub fn on_attached(&mut self, keyframe_id: KeyframeId, label: Label) {
        if self.target != Some(keyframe_id) {
            return;
        }
        self.append_tag(label);
        self.query.clear();
        self.generation += 1;
        self.deadline = None;
        self.clear_candidates();
    }

    /// Produce a detach request for the bound target.
    pub fn remove_tag(&self, label_id: LabelId) -> Option<(KeyframeId, LabelId)> {
        self.target.map(|target| (target, label_id))
    }

    /// Apply a successful detach: drop the visual tag.
    pub fn on_detached(&mut self, keyframe_id: KeyframeId, label_id: LabelId) {
        if self.target != Some(keyframe_id) {
            return;
        }
        self.tags.retain(|l| l.id != label_id);
    }

    /// Append a tag unless one with the same label id already exists.
    pub fn append_tag(&mut self, label: Label) {
        if self.tags.iter().any(|l| l.id == label.id) {
            return;
        }
        self.tags.push(label);
    }

    /// Replace the tag collection (used when the panel repopulates from a
    /// newly selected keyframe's cached label set).
    pub fn set_tags(&mut self, labels: Vec<Label>) {
        self.tags.clear();
        for label in labels {
            self.append_tag(label);
        }
    }

    /// Hide the suggestion list and forget the current candidates.
    pub fn dismiss(&mut self) {
        self.clear_candidates();
    }

    /// Repoint future searches and commits at a new target. Cancels any
    /// pending search and resets the query, but deliberately leaves the tag
    /// collection alone: the caller repopulates it from the new target.
    pub fn rebind(&mut self, target: Option<KeyframeId>) {
        self.target = target;
        self.deadline = None;
        self.query.clear();
        self.generation += 1;
        self.clear_candidates();
    }

    /// Cancel any pending search timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    fn clear_candidates(&mut self) {
        self.candidates.clear();
        self.active_index = -1;
    }
}

impl Default for LabelAutocomplete {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte range of the first ASCII case-insensitive occurrence of `query` in
/// `name`, for rendering the matched substring distinctly.
pub fn match_range(name: &str, query: &str) -> Option<(usize, usize)> {
    let hay = name.as_bytes();
    let needle = query.trim().as_bytes();
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len())
        .find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
        .map(|i| (i, i + needle.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<Label> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Label::new(i as i64 + 1, *n))
            .collect()
    }

    fn searched(ac: &mut LabelAutocomplete, now: Instant, query: &str, results: &[&str]) {
        ac.on_query_change(query, now);
        let req = ac.poll_search(now + SEARCH_IDLE).expect("search scheduled");
        ac.on_search_results(req.generation, labels(results));
    }

    #[test]
    fn test_search_waits_for_idle_window() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(1));
        ac.on_query_change("cat", start);

        assert!(ac.poll_search(start + Duration::from_millis(199)).is_none());
        let req = ac.poll_search(start + Duration::from_millis(200)).unwrap();
        assert_eq!(req.query, "cat");
        // Fires at most once per window.
        assert!(ac.poll_search(start + Duration::from_millis(300)).is_none());
    }

    #[test]
    fn test_empty_query_clears_immediately() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(1));
        searched(&mut ac, start, "cat", &["category"]);
        assert!(ac.is_open());

        ac.on_query_change("   ", start);
        assert!(!ac.is_open());
        assert_eq!(ac.active_index(), -1);
        assert!(ac.poll_search(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_stale_search_response_is_discarded() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(1));
        ac.on_query_change("ca", start);
        let old = ac.poll_search(start + SEARCH_IDLE).unwrap();

        // User keeps typing before the old response lands.
        ac.on_query_change("cat", start + SEARCH_IDLE);
        let new = ac.poll_search(start + SEARCH_IDLE * 2).unwrap();

        ac.on_search_results(old.generation, labels(&["cab", "car"]));
        assert!(ac.candidates().is_empty());

        ac.on_search_results(new.generation, labels(&["category"]));
        assert_eq!(ac.candidates().len(), 1);
    }

    #[test]
    fn test_active_index_stays_in_bounds() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(1));

        // No candidates: moves are no-ops.
        ac.move_active(1);
        ac.move_active(-1);
        assert_eq!(ac.active_index(), -1);

        searched(&mut ac, start, "ca", &["cab", "car", "cat"]);
        for _ in 0..10 {
            ac.move_active(1);
        }
        assert_eq!(ac.active_index(), 2);
        for _ in 0..10 {
            ac.move_active(-1);
        }
        assert_eq!(ac.active_index(), -1);

        // Replacing candidates resets the highlight.
        ac.move_active(1);
        searched(&mut ac, start + Duration::from_secs(1), "cat", &["cat"]);
        assert_eq!(ac.active_index(), -1);
    }

    #[test]
    fn test_enter_commits_highlighted_candidate() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(9));
        searched(&mut ac, start, "cat", &["category"]);

        assert_eq!(ac.handle_key(KeyInput::ArrowDown), None);
        let name = ac.handle_key(KeyInput::Enter).unwrap();
        assert_eq!(name, "category");
        assert_eq!(ac.commit(&name), Some((9, "category".to_string())));
    }

    #[test]
    fn test_enter_commits_raw_text_when_nothing_highlighted() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(9));
        ac.on_query_change("  new label  ", start);

        assert_eq!(ac.handle_key(KeyInput::Enter), Some("new label".to_string()));

        ac.on_query_change("   ", start);
        assert_eq!(ac.handle_key(KeyInput::Enter), None);
    }

    #[test]
    fn test_escape_hides_suggestions() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(1));
        searched(&mut ac, start, "cat", &["category"]);

        assert_eq!(ac.handle_key(KeyInput::Escape), None);
        assert!(!ac.is_open());
    }

    #[test]
    fn test_attach_ack_appends_once_and_clears_query() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(9));
        searched(&mut ac, start, "cat", &["category"]);

        ac.on_attached(9, Label::new(1, "category"));
        ac.on_attached(9, Label::new(1, "category"));

        assert_eq!(ac.tags().len(), 1);
        assert!(ac.query().is_empty());
        assert!(!ac.is_open());
    }

    #[test]
    fn test_attach_ack_for_old_target_is_ignored() {
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(9));
        ac.rebind(Some(10));

        ac.on_attached(9, Label::new(1, "category"));
        assert!(ac.tags().is_empty());
    }

    #[test]
    fn test_detach_removes_tag_after_ack_only() {
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(9));
        ac.append_tag(Label::new(1, "cat"));

        let req = ac.remove_tag(1).unwrap();
        assert_eq!(req, (9, 1));
        assert_eq!(ac.tags().len(), 1);

        ac.on_detached(9, 1);
        assert!(ac.tags().is_empty());
    }

    #[test]
    fn test_rebind_keeps_tags_but_cancels_search() {
        let start = Instant::now();
        let mut ac = LabelAutocomplete::new();
        ac.rebind(Some(9));
        ac.append_tag(Label::new(1, "cat"));
        ac.on_query_change("do", start);

        ac.rebind(Some(10));
        assert_eq!(ac.tags().len(), 1);
        assert!(ac.query().is_empty());
        assert!(ac.poll_search(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_commit_without_target_is_skipped() {
        let ac = LabelAutocomplete::new();
        assert_eq!(ac.commit("cat"), None);
    }

    #[test]
    fn test_match_range_is_case_insensitive() {
        assert_eq!(match_range("Category", "cat"), Some((0, 3)));
        assert_eq!(match_range("wildcat", "CAT"), Some((4, 7)));
        assert_eq!(match_range("dog", "cat"), None);
        assert_eq!(match_range("cat", ""), None);
    }
}
