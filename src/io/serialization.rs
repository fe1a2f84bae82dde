// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Library persistence and annotation export.
//!
//! The annotation library lives in a JSON sidecar file inside the media
//! root. Annotation exports write one media file's keyframes (with labels)
//! in YAML or JSON format.

use crate::models::keyframe::Keyframe;
use crate::models::label::Label;
use crate::models::library::Library;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the library sidecar file inside the media root.
pub const LIBRARY_FILE: &str = "keymark.json";

pub fn library_path(media_root: &Path) -> PathBuf {
    media_root.join(LIBRARY_FILE)
}

/// Load the library sidecar for a media root, falling back to an empty
/// library when the file is missing or malformed.
pub fn load_or_new(media_root: &Path) -> Library {
    let path = library_path(media_root);
    let root = media_root.to_string_lossy().to_string();

    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(_) => return Library::new(root),
    };

    match serde_json::from_str(&json) {
        Ok(library) => library,
        Err(e) => {
            log::warn!("Malformed library file {}: {}", path.display(), e);
            Library::new(root)
        }
    }
}

/// Write the library sidecar.
pub fn save_library(library: &Library, media_root: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(library)?;
    std::fs::write(library_path(media_root), json)?;
    Ok(())
}

/// One media file's annotations, as written by the export commands.
#[derive(Debug, Clone, Serialize)]
pub struct ExportData {
    pub media_file: String,
    pub description: String,
    pub labels: Vec<Label>,
    pub keyframes: Vec<Keyframe>,
}

/// Export annotations to YAML format.
pub fn export_yaml(data: &ExportData, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export annotations to JSON format.
pub fn export_json(data: &ExportData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::library::MediaType;

    fn temp_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("keymark-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn test_library_round_trip() {
        let root = temp_root("lib");
        let mut library = Library::new(root.to_string_lossy().to_string());
        let file_id = library.register_file("a.mp3".to_string(), MediaType::Audio, Some(9000));
        let kf = library.create_keyframe(file_id, 1234).unwrap();
        library.attach_label(kf.id, "cat").unwrap();
        library
            .update_file_description(file_id, "field recording".to_string())
            .unwrap();
        library.attach_file_label(file_id, "outdoors").unwrap();

        save_library(&library, &root).unwrap();
        let loaded = load_or_new(&root);

        let keyframes = loaded.keyframes_for_file(file_id);
        assert_eq!(keyframes.len(), 1);
        assert_eq!(keyframes[0].timestamp_ms, 1234);
        assert_eq!(keyframes[0].labels[0].name, "cat");
        assert_eq!(loaded.get_file(file_id).unwrap().description, "field recording");
        assert_eq!(loaded.file_labels(file_id)[0].name, "outdoors");

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_malformed_library_treated_as_empty() {
        let root = temp_root("bad");
        std::fs::write(library_path(&root), b"{ not json").unwrap();

        let loaded = load_or_new(&root);
        assert!(loaded.files.is_empty());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_library_treated_as_empty() {
        let root = temp_root("none");
        let loaded = load_or_new(&root);
        assert!(loaded.files.is_empty());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
