// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation library state management.
//!
//! The library holds everything that persists between sessions: the scanned
//! media files, the global label table, the keyframes and their label
//! associations. It is the in-process analogue of a small relational store,
//! owned exclusively by the store worker thread.

use super::keyframe::{Keyframe, KeyframeId, MediaFileId};
use super::label::{Label, LabelId};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// Maximum number of results returned by a label prefix search.
const SEARCH_LIMIT: usize = 10;

/// Kind of media a library entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

/// A discovered media file. Like keyframes, files carry a description and a
/// label set; labels are stored as association ids and resolved through
/// [`Library::file_labels`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: MediaFileId,
    /// Path relative to the library's media root.
    pub path: String,
    pub media_type: MediaType,
    /// Container duration, when the probe could determine it.
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    label_ids: Vec<LabelId>,
}

/// Stored form of a keyframe: labels are kept as association ids and
/// resolved against the label table when the keyframe leaves the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyframeRecord {
    id: KeyframeId,
    file_id: MediaFileId,
    timestamp_ms: u64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    label_ids: Vec<LabelId>,
}

/// Complete annotation library for one media root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub media_root: String,
    pub files: Vec<MediaFile>,
    labels: Vec<Label>,
    keyframes: Vec<KeyframeRecord>,
    next_keyframe_id: KeyframeId,
    next_label_id: LabelId,
}

impl Library {
    /// Create an empty library for the given media root.
    pub fn new(media_root: String) -> Self {
        Self {
            media_root,
            files: Vec::new(),
            labels: Vec::new(),
            keyframes: Vec::new(),
            next_keyframe_id: 1,
            next_label_id: 1,
        }
    }

    /// Register a scanned media file, reusing the existing entry (and its
    /// keyframes) if the path is already known.
    pub fn register_file(
        &mut self,
        path: String,
        media_type: MediaType,
        duration_ms: Option<u64>,
    ) -> MediaFileId {
        if let Some(existing) = self.files.iter_mut().find(|f| f.path == path) {
            if duration_ms.is_some() {
                existing.duration_ms = duration_ms;
            }
            return existing.id;
        }

        let id = self.files.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        self.files.push(MediaFile {
            id,
            path,
            media_type,
            duration_ms,
            description: String::new(),
            label_ids: Vec::new(),
        });
        id
    }

    pub fn get_file(&self, id: MediaFileId) -> Option<&MediaFile> {
        self.files.iter().find(|f| f.id == id)
    }

    fn get_file_mut(&mut self, id: MediaFileId) -> Result<&mut MediaFile> {
        self.files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| anyhow!("media file {} not found", id))
    }

    /// Update a media file's description.
    pub fn update_file_description(&mut self, id: MediaFileId, description: String) -> Result<()> {
        self.get_file_mut(id)?.description = description;
        Ok(())
    }

    /// Associate a label (found or created by name) with a media file.
    /// Attaching an already-attached label is a no-op.
    pub fn attach_file_label(&mut self, file_id: MediaFileId, name: &str) -> Result<Label> {
        let label = self.find_or_create_label(name)?;
        let file = self.get_file_mut(file_id)?;
        if !file.label_ids.contains(&label.id) {
            file.label_ids.push(label.id);
        }
        Ok(label)
    }

    /// Remove a label association from a media file.
    pub fn detach_file_label(&mut self, file_id: MediaFileId, label_id: LabelId) -> Result<()> {
        self.get_file_mut(file_id)?
            .label_ids
            .retain(|id| *id != label_id);
        Ok(())
    }

    /// A media file's labels, resolved against the label table.
    pub fn file_labels(&self, file_id: MediaFileId) -> Vec<Label> {
        let Some(file) = self.get_file(file_id) else {
            return Vec::new();
        };
        file.label_ids
            .iter()
            .filter_map(|id| self.labels.iter().find(|l| l.id == *id))
            .cloned()
            .collect()
    }

    /// Create the pinned 0:00 keyframe for a media file if it doesn't exist.
    pub fn ensure_pinned_keyframe(&mut self, file_id: MediaFileId) {
        let exists = self
            .keyframes
            .iter()
            .any(|kf| kf.file_id == file_id && kf.pinned);
        if exists {
            return;
        }

        let id = self.take_keyframe_id();
        self.keyframes.push(KeyframeRecord {
            id,
            file_id,
            timestamp_ms: 0,
            description: String::new(),
            pinned: true,
            label_ids: Vec::new(),
        });
    }

    /// All keyframes for a media file, ordered by timestamp (ties keep
    /// creation order), with labels resolved.
    pub fn keyframes_for_file(&self, file_id: MediaFileId) -> Vec<Keyframe> {
        let mut records: Vec<&KeyframeRecord> = self
            .keyframes
            .iter()
            .filter(|kf| kf.file_id == file_id)
            .collect();
        records.sort_by_key(|kf| kf.timestamp_ms);
        records.iter().map(|kf| self.resolve(kf)).collect()
    }

    /// Add a new keyframe at the given timestamp and return it.
    pub fn create_keyframe(&mut self, file_id: MediaFileId, timestamp_ms: u64) -> Result<Keyframe> {
        if self.get_file(file_id).is_none() {
            bail!("media file {} not found", file_id);
        }

        let id = self.take_keyframe_id();
        let record = KeyframeRecord {
            id,
            file_id,
            timestamp_ms,
            description: String::new(),
            pinned: false,
            label_ids: Vec::new(),
        };
        let keyframe = self.resolve(&record);
        self.keyframes.push(record);
        Ok(keyframe)
    }

    /// Remove a keyframe. Rejects pinned keyframes.
    pub fn delete_keyframe(&mut self, id: KeyframeId) -> Result<()> {
        let record = self
            .keyframes
            .iter()
            .find(|kf| kf.id == id)
            .ok_or_else(|| anyhow!("keyframe {} not found", id))?;
        if record.pinned {
            bail!("cannot delete pinned keyframe {}", id);
        }
        self.keyframes.retain(|kf| kf.id != id);
        Ok(())
    }

    /// Update a keyframe's description.
    pub fn update_description(&mut self, id: KeyframeId, description: String) -> Result<()> {
        let record = self
            .keyframes
            .iter_mut()
            .find(|kf| kf.id == id)
            .ok_or_else(|| anyhow!("keyframe {} not found", id))?;
        record.description = description;
        Ok(())
    }

    /// Return an existing label by name, or create one. Name matching is
    /// exact; the caller is expected to have trimmed the input.
    pub fn find_or_create_label(&mut self, name: &str) -> Result<Label> {
        if name.is_empty() {
            bail!("label name must not be empty");
        }
        if let Some(label) = self.labels.iter().find(|l| l.name == name) {
            return Ok(label.clone());
        }

        let label = Label::new(self.next_label_id, name);
        self.next_label_id += 1;
        self.labels.push(label.clone());
        Ok(label)
    }

    /// Labels matching a prefix query (ASCII case-insensitive), ordered by
    /// name, limited to [`SEARCH_LIMIT`] results.
    pub fn search_labels(&self, query: &str) -> Vec<Label> {
        let needle = query.to_ascii_lowercase();
        let mut matches: Vec<Label> = self
            .labels
            .iter()
            .filter(|l| l.name.to_ascii_lowercase().starts_with(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches.truncate(SEARCH_LIMIT);
        matches
    }

    /// Associate a label (found or created by name) with a keyframe.
    /// Attaching an already-attached label is a no-op.
    pub fn attach_label(&mut self, keyframe_id: KeyframeId, name: &str) -> Result<Label> {
        let label = self.find_or_create_label(name)?;
        let record = self
            .keyframes
            .iter_mut()
            .find(|kf| kf.id == keyframe_id)
            .ok_or_else(|| anyhow!("keyframe {} not found", keyframe_id))?;
        if !record.label_ids.contains(&label.id) {
            record.label_ids.push(label.id);
        }
        Ok(label)
    }

    /// Remove a label association from a keyframe.
    pub fn detach_label(&mut self, keyframe_id: KeyframeId, label_id: LabelId) -> Result<()> {
        let record = self
            .keyframes
            .iter_mut()
            .find(|kf| kf.id == keyframe_id)
            .ok_or_else(|| anyhow!("keyframe {} not found", keyframe_id))?;
        record.label_ids.retain(|id| *id != label_id);
        Ok(())
    }

    fn resolve(&self, record: &KeyframeRecord) -> Keyframe {
        let labels = record
            .label_ids
            .iter()
            .filter_map(|id| self.labels.iter().find(|l| l.id == *id))
            .cloned()
            .collect();
        Keyframe {
            id: record.id,
            file_id: record.file_id,
            timestamp_ms: record.timestamp_ms,
            description: record.description.clone(),
            pinned: record.pinned,
            labels,
        }
    }

    fn take_keyframe_id(&mut self) -> KeyframeId {
        let id = self.next_keyframe_id;
        self.next_keyframe_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_with_file() -> (Library, MediaFileId) {
        let mut lib = Library::new("/media".to_string());
        let file_id = lib.register_file("a.mp3".to_string(), MediaType::Audio, Some(120_000));
        (lib, file_id)
    }

    #[test]
    fn test_ensure_pinned_keyframe_is_idempotent() {
        let (mut lib, file_id) = library_with_file();
        lib.ensure_pinned_keyframe(file_id);
        lib.ensure_pinned_keyframe(file_id);

        let keyframes = lib.keyframes_for_file(file_id);
        assert_eq!(keyframes.len(), 1);
        assert!(keyframes[0].pinned);
        assert_eq!(keyframes[0].timestamp_ms, 0);
    }

    #[test]
    fn test_delete_pinned_keyframe_is_rejected() {
        let (mut lib, file_id) = library_with_file();
        lib.ensure_pinned_keyframe(file_id);
        let pinned_id = lib.keyframes_for_file(file_id)[0].id;

        assert!(lib.delete_keyframe(pinned_id).is_err());
        assert_eq!(lib.keyframes_for_file(file_id).len(), 1);
    }

    #[test]
    fn test_keyframes_ordered_by_timestamp() {
        let (mut lib, file_id) = library_with_file();
        lib.create_keyframe(file_id, 5000).unwrap();
        lib.create_keyframe(file_id, 1000).unwrap();
        lib.create_keyframe(file_id, 3000).unwrap();

        let times: Vec<u64> = lib
            .keyframes_for_file(file_id)
            .iter()
            .map(|kf| kf.timestamp_ms)
            .collect();
        assert_eq!(times, vec![1000, 3000, 5000]);
    }

    #[test]
    fn test_find_or_create_label_reuses_existing() {
        let (mut lib, _) = library_with_file();
        let first = lib.find_or_create_label("cat").unwrap();
        let second = lib.find_or_create_label("cat").unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_search_labels_prefix_and_limit() {
        let (mut lib, _) = library_with_file();
        for i in 0..15 {
            lib.find_or_create_label(&format!("cat-{:02}", i)).unwrap();
        }
        lib.find_or_create_label("dog").unwrap();

        let results = lib.search_labels("CAT");
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|l| l.name.starts_with("cat-")));
        assert_eq!(results[0].name, "cat-00");

        assert!(lib.search_labels("zebra").is_empty());
    }

    #[test]
    fn test_attach_label_is_idempotent() {
        let (mut lib, file_id) = library_with_file();
        let kf = lib.create_keyframe(file_id, 1000).unwrap();

        lib.attach_label(kf.id, "cat").unwrap();
        lib.attach_label(kf.id, "cat").unwrap();

        let labels = &lib.keyframes_for_file(file_id)[0].labels;
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "cat");
    }

    #[test]
    fn test_detach_label() {
        let (mut lib, file_id) = library_with_file();
        let kf = lib.create_keyframe(file_id, 1000).unwrap();
        let label = lib.attach_label(kf.id, "cat").unwrap();

        lib.detach_label(kf.id, label.id).unwrap();
        assert!(lib.keyframes_for_file(file_id)[0].labels.is_empty());
    }

    #[test]
    fn test_file_description_update() {
        let (mut lib, file_id) = library_with_file();
        lib.update_file_description(file_id, "a whole-file note".to_string())
            .unwrap();
        assert_eq!(lib.get_file(file_id).unwrap().description, "a whole-file note");

        assert!(lib
            .update_file_description(99, "nope".to_string())
            .is_err());
    }

    #[test]
    fn test_attach_file_label_is_idempotent() {
        let (mut lib, file_id) = library_with_file();
        lib.attach_file_label(file_id, "interview").unwrap();
        lib.attach_file_label(file_id, "interview").unwrap();

        let labels = lib.file_labels(file_id);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "interview");
    }

    #[test]
    fn test_file_and_keyframe_labels_share_the_label_table() {
        let (mut lib, file_id) = library_with_file();
        let kf = lib.create_keyframe(file_id, 1000).unwrap();

        let on_file = lib.attach_file_label(file_id, "cat").unwrap();
        let on_keyframe = lib.attach_label(kf.id, "cat").unwrap();
        assert_eq!(on_file.id, on_keyframe.id);

        // Detaching from the file leaves the keyframe association alone.
        lib.detach_file_label(file_id, on_file.id).unwrap();
        assert!(lib.file_labels(file_id).is_empty());
        assert_eq!(lib.keyframes_for_file(file_id)[0].labels.len(), 1);
    }

    #[test]
    fn test_register_file_reuses_path() {
        let mut lib = Library::new("/media".to_string());
        let a = lib.register_file("a.mp3".to_string(), MediaType::Audio, None);
        let b = lib.register_file("a.mp3".to_string(), MediaType::Audio, Some(9000));
        assert_eq!(a, b);
        assert_eq!(lib.get_file(a).unwrap().duration_ms, Some(9000));
    }
}
