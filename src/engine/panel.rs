// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detail panel synchronizer.
//!
//! Composes the debounced field persister and the label autocomplete engine
//! and keeps both bound to the currently selected keyframe. On a selection
//! change the panel is cleared, both sub-engines are rebound to the new id,
//! and the description and tags are repopulated from the new keyframe's
//! cached data, so edits never leak between keyframes.

use super::autocomplete::LabelAutocomplete;
use super::persister::FieldPersister;
use crate::models::keyframe::KeyframeId;
use crate::models::label::Label;
use std::time::Instant;

pub struct DetailPanel {
    bound: Option<KeyframeId>,
    description: String,
    persister: FieldPersister,
    autocomplete: LabelAutocomplete,
}

impl DetailPanel {
    pub fn new() -> Self {
        Self {
            bound: None,
            description: String::new(),
            persister: FieldPersister::new(),
            autocomplete: LabelAutocomplete::new(),
        }
    }

    pub fn bound(&self) -> Option<KeyframeId> {
        self.bound
    }

    /// Whether the panel should be shown at all.
    pub fn is_visible(&self) -> bool {
        self.bound.is_some()
    }

    /// Bind the panel to a keyframe and repopulate it from that keyframe's
    /// cached description and labels. Pending timers of the previous binding
    /// are cancelled; the caller flushes outgoing edits beforehand.
    pub fn bind(&mut self, id: KeyframeId, description: String, labels: Vec<Label>) {
        self.bound = Some(id);
        self.description = description;
        self.persister.rebind(Some(id));
        self.autocomplete.rebind(Some(id));
        self.autocomplete.set_tags(labels);
    }

    /// Unbind and empty the panel (selection cleared or keyframe deleted).
    pub fn clear(&mut self) {
        self.bound = None;
        self.description.clear();
        self.persister.rebind(None);
        self.autocomplete.rebind(None);
        self.autocomplete.set_tags(Vec::new());
    }

    /// Cancel all pending timers without touching panel content. Called on
    /// teardown so nothing fires after the panel's owner is gone.
    pub fn cancel_timers(&mut self) {
        self.persister.cancel();
        self.autocomplete.cancel();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn description_mut(&mut self) -> &mut String {
        &mut self.description
    }

    /// Record a description keystroke, (re)starting the autosave window.
    pub fn on_description_edit(&mut self, now: Instant) {
        self.persister.on_edit(now);
    }

    /// Fire a due autosave: the full current text, keyed by the target id
    /// captured when the timer fired.
    pub fn poll_save(&mut self, now: Instant) -> Option<(KeyframeId, String)> {
        let target = self.persister.poll(now)?;
        Some((target, self.description.clone()))
    }

    /// Current panel content, for flushing into the keyframe cache before a
    /// selection switch.
    pub fn snapshot(&self) -> (String, Vec<Label>) {
        (self.description.clone(), self.autocomplete.tags().to_vec())
    }

    /// Whether either sub-engine has a timer waiting to fire.
    pub fn has_pending_timers(&self) -> bool {
        self.persister.is_pending() || self.autocomplete.is_pending()
    }

    pub fn autocomplete(&self) -> &LabelAutocomplete {
        &self.autocomplete
    }

    pub fn autocomplete_mut(&mut self) -> &mut LabelAutocomplete {
        &mut self.autocomplete
    }
}

impl Default for DetailPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::timeline::TimelineEngine;
    use crate::models::keyframe::Keyframe;
    use std::time::Duration;

    /// The selection flow as the application shell runs it: flush the
    /// outgoing keyframe's panel state into its cache, then bind the panel
    /// to the incoming keyframe's cache.
    fn select(engine: &mut TimelineEngine, panel: &mut DetailPanel, id: i64) {
        if let Some(prev) = engine.selected_id() {
            let (description, labels) = panel.snapshot();
            engine.cache_panel_state(prev, description, labels);
        }
        if engine.set_selected(id) {
            let marker = engine.marker(id).unwrap();
            panel.bind(id, marker.description.clone(), marker.labels.clone());
        }
    }

    #[test]
    fn test_reselect_restores_edits_without_cross_talk() {
        let mut engine = TimelineEngine::new();
        engine.on_metadata_ready(60_000.0);
        engine.insert_acknowledged(Keyframe::new(1, 1, 1000));
        engine.insert_acknowledged(Keyframe::new(2, 1, 2000));
        let mut panel = DetailPanel::new();

        // Edit A, switch to B, edit B, come back to A.
        select(&mut engine, &mut panel, 1);
        panel.description_mut().push_str("note for A");
        panel.autocomplete_mut().append_tag(Label::new(7, "cat"));

        select(&mut engine, &mut panel, 2);
        assert_eq!(panel.description(), "");
        assert!(panel.autocomplete().tags().is_empty());
        panel.description_mut().push_str("note for B");

        select(&mut engine, &mut panel, 1);
        assert_eq!(panel.description(), "note for A");
        assert_eq!(panel.autocomplete().tags().len(), 1);

        select(&mut engine, &mut panel, 2);
        assert_eq!(panel.description(), "note for B");
        assert!(panel.autocomplete().tags().is_empty());
    }

    #[test]
    fn test_selection_switch_drops_stale_save_timer() {
        let start = Instant::now();
        let mut engine = TimelineEngine::new();
        engine.on_metadata_ready(60_000.0);
        engine.insert_acknowledged(Keyframe::new(1, 1, 1000));
        engine.insert_acknowledged(Keyframe::new(2, 1, 2000));
        let mut panel = DetailPanel::new();

        select(&mut engine, &mut panel, 1);
        panel.description_mut().push_str("draft");
        panel.on_description_edit(start);

        // Switch before the 500ms idle window elapses.
        select(&mut engine, &mut panel, 2);
        assert_eq!(panel.poll_save(start + Duration::from_secs(2)), None);
        assert_eq!(panel.description(), "");

        // The draft still comes back from the cache on reselect.
        select(&mut engine, &mut panel, 1);
        assert_eq!(panel.description(), "draft");
    }

    #[test]
    fn test_save_keyed_by_bound_target() {
        let start = Instant::now();
        let mut panel = DetailPanel::new();
        panel.bind(4, String::new(), Vec::new());
        panel.description_mut().push_str("hello");
        panel.on_description_edit(start);

        let fired = panel.poll_save(start + Duration::from_millis(500));
        assert_eq!(fired, Some((4, "hello".to_string())));
        assert_eq!(panel.poll_save(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_clear_hides_and_empties_panel() {
        let start = Instant::now();
        let mut panel = DetailPanel::new();
        panel.bind(4, "text".to_string(), vec![Label::new(1, "cat")]);
        panel.on_description_edit(start);

        panel.clear();
        assert!(!panel.is_visible());
        assert_eq!(panel.description(), "");
        assert!(panel.autocomplete().tags().is_empty());
        assert_eq!(panel.poll_save(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_bind_repopulates_tags_without_duplicates() {
        let mut panel = DetailPanel::new();
        let labels = vec![
            Label::new(1, "cat"),
            Label::new(1, "cat"),
            Label::new(2, "dog"),
        ];
        panel.bind(4, String::new(), labels);
        assert_eq!(panel.autocomplete().tags().len(), 2);
    }
}
