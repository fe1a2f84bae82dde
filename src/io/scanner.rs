// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media folder scanning.
//!
//! Walks a directory tree and returns every recognized audio/video file,
//! sorted by relative path. Stills are skipped: keyframes only make sense on
//! time-based media.

use crate::models::library::MediaType;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// A discovered media file.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Path relative to the scan root.
    pub path: String,
    pub media_type: MediaType,
}

/// Map a file extension to its media type, if it is one we handle.
pub fn media_type_for_extension(ext: &str) -> Option<MediaType> {
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "webm" | "mkv" | "avi" | "mov" | "m4v" | "ogv" => Some(MediaType::Video),
        "mp3" | "wav" | "ogg" | "flac" | "aac" | "m4a" | "opus" => Some(MediaType::Audio),
        _ => None,
    }
}

/// Recursively scan `root` for media files.
pub fn scan(root: &Path) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<ScannedFile>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path: PathBuf = entry.path();
        if path.is_dir() {
            walk(root, &path, files)?;
            continue;
        }

        let Some(media_type) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(media_type_for_extension)
        else {
            continue;
        };

        let rel = path.strip_prefix(root).unwrap_or(&path);
        files.push(ScannedFile {
            path: rel.to_string_lossy().to_string(),
            media_type,
        });
    }
    Ok(())
}
