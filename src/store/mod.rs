// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background annotation store.
//!
//! All keyframe and label mutations go through a worker thread that owns the
//! [`Library`] and persists it to the sidecar file after every change. The
//! UI thread sends requests and polls responses over channels, so no store
//! operation ever blocks a frame.
//!
//! Responses only ever confirm what actually happened: the UI applies no
//! mutation before its acknowledgment arrives. Description saves are
//! fire-and-forget; search responses echo the generation of the query that
//! produced them so stale results can be discarded.

use crate::io::serialization::{self, ExportData};
use crate::models::keyframe::{Keyframe, KeyframeId, MediaFileId};
use crate::models::label::{Label, LabelId};
use crate::models::library::Library;
use std::cell::Cell;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Yaml,
    Json,
}

/// Which annotation editor a label search came from. Echoed back with the
/// results so responses reach the editor whose generation counter they
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationScope {
    Keyframe,
    File,
}

/// A request for the store worker.
#[derive(Debug, Clone)]
pub enum StoreRequest {
    /// Ensure the pinned 0:00 keyframe exists and return the file's
    /// annotations.
    OpenFile { file_id: MediaFileId },
    CreateKeyframe {
        file_id: MediaFileId,
        timestamp_ms: u64,
    },
    DeleteKeyframe { id: KeyframeId },
    /// Fire-and-forget: no response is sent, failures are logged.
    SaveDescription { id: KeyframeId, text: String },
    /// Fire-and-forget, like `SaveDescription` but for the file itself.
    SaveFileDescription { id: MediaFileId, text: String },
    SearchLabels {
        query: String,
        generation: u64,
        scope: AnnotationScope,
    },
    AttachLabel {
        keyframe_id: KeyframeId,
        name: String,
    },
    DetachLabel {
        keyframe_id: KeyframeId,
        label_id: LabelId,
    },
    AttachFileLabel {
        file_id: MediaFileId,
        name: String,
    },
    DetachFileLabel {
        file_id: MediaFileId,
        label_id: LabelId,
    },
    Export {
        file_id: MediaFileId,
        path: PathBuf,
        format: ExportFormat,
    },
}

impl StoreRequest {
    /// Whether the worker will send a response for this request. Saves are
    /// fully fire-and-forget.
    fn expects_response(&self) -> bool {
        !matches!(
            self,
            StoreRequest::SaveDescription { .. } | StoreRequest::SaveFileDescription { .. }
        )
    }
}

/// A response from the store worker.
#[derive(Debug, Clone)]
pub enum StoreResponse {
    FileOpened {
        file_id: MediaFileId,
        description: String,
        labels: Vec<Label>,
        keyframes: Vec<Keyframe>,
    },
    KeyframeCreated(Keyframe),
    KeyframeDeleted { id: KeyframeId },
    SearchResults {
        generation: u64,
        scope: AnnotationScope,
        labels: Vec<Label>,
    },
    LabelAttached {
        keyframe_id: KeyframeId,
        label: Label,
    },
    LabelDetached {
        keyframe_id: KeyframeId,
        label_id: LabelId,
    },
    FileLabelAttached {
        file_id: MediaFileId,
        label: Label,
    },
    FileLabelDetached {
        file_id: MediaFileId,
        label_id: LabelId,
    },
    Exported { path: PathBuf },
    /// The request failed; prior state is untouched on both sides.
    Failure { op: &'static str, message: String },
}

/// Handle to the store worker thread.
pub struct StoreHandle {
    tx: Sender<StoreRequest>,
    rx: Receiver<StoreResponse>,
    /// Requests dispatched but not yet answered. Lets the frame loop keep
    /// polling while an acknowledgment is on its way.
    in_flight: Cell<usize>,
}

impl StoreHandle {
    /// Spawn the worker that owns the library for the given media root.
    pub fn spawn(library: Library, media_root: PathBuf) -> Self {
        let (req_tx, req_rx) = channel::<StoreRequest>();
        let (resp_tx, resp_rx) = channel::<StoreResponse>();

        std::thread::spawn(move || {
            let mut worker = Worker {
                library,
                media_root,
            };
            while let Ok(request) = req_rx.recv() {
                if let Some(response) = worker.handle(request) {
                    if resp_tx.send(response).is_err() {
                        break;
                    }
                }
            }
        });

        Self {
            tx: req_tx,
            rx: resp_rx,
            in_flight: Cell::new(0),
        }
    }

    pub fn send(&self, request: StoreRequest) {
        let counted = request.expects_response();
        if self.tx.send(request).is_err() {
            log::error!("Store worker is gone; request dropped");
            return;
        }
        if counted {
            self.in_flight.set(self.in_flight.get() + 1);
        }
    }

    /// Non-blocking poll for the next response, called once per frame loop.
    pub fn try_recv(&self) -> Option<StoreResponse> {
        let response = self.rx.try_recv().ok()?;
        self.in_flight.set(self.in_flight.get().saturating_sub(1));
        Some(response)
    }

    /// Whether any dispatched request is still awaiting its response.
    pub fn has_in_flight(&self) -> bool {
        self.in_flight.get() > 0
    }
}

struct Worker {
    library: Library,
    media_root: PathBuf,
}

impl Worker {
    fn handle(&mut self, request: StoreRequest) -> Option<StoreResponse> {
        match request {
            StoreRequest::OpenFile { file_id } => {
                self.library.ensure_pinned_keyframe(file_id);
                self.persist();
                Some(StoreResponse::FileOpened {
                    file_id,
                    description: self
                        .library
                        .get_file(file_id)
                        .map(|f| f.description.clone())
                        .unwrap_or_default(),
                    labels: self.library.file_labels(file_id),
                    keyframes: self.library.keyframes_for_file(file_id),
                })
            }
            StoreRequest::CreateKeyframe {
                file_id,
                timestamp_ms,
            } => match self.library.create_keyframe(file_id, timestamp_ms) {
                Ok(keyframe) => {
                    self.persist();
                    Some(StoreResponse::KeyframeCreated(keyframe))
                }
                Err(e) => Some(failure("create keyframe", e)),
            },
            StoreRequest::DeleteKeyframe { id } => match self.library.delete_keyframe(id) {
                Ok(()) => {
                    self.persist();
                    Some(StoreResponse::KeyframeDeleted { id })
                }
                Err(e) => Some(failure("delete keyframe", e)),
            },
            StoreRequest::SaveDescription { id, text } => {
                match self.library.update_description(id, text) {
                    Ok(()) => self.persist(),
                    Err(e) => log::error!("Failed to save keyframe description: {}", e),
                }
                None
            }
            StoreRequest::SaveFileDescription { id, text } => {
                match self.library.update_file_description(id, text) {
                    Ok(()) => self.persist(),
                    Err(e) => log::error!("Failed to save file description: {}", e),
                }
                None
            }
            StoreRequest::SearchLabels {
                query,
                generation,
                scope,
            } => Some(StoreResponse::SearchResults {
                generation,
                scope,
                labels: self.library.search_labels(&query),
            }),
            StoreRequest::AttachLabel { keyframe_id, name } => {
                match self.library.attach_label(keyframe_id, &name) {
                    Ok(label) => {
                        self.persist();
                        Some(StoreResponse::LabelAttached { keyframe_id, label })
                    }
                    Err(e) => Some(failure("attach label", e)),
                }
            }
            StoreRequest::DetachLabel {
                keyframe_id,
                label_id,
            } => match self.library.detach_label(keyframe_id, label_id) {
                Ok(()) => {
                    self.persist();
                    Some(StoreResponse::LabelDetached {
                        keyframe_id,
                        label_id,
                    })
                }
                Err(e) => Some(failure("detach label", e)),
            },
            StoreRequest::AttachFileLabel { file_id, name } => {
                match self.library.attach_file_label(file_id, &name) {
                    Ok(label) => {
                        self.persist();
                        Some(StoreResponse::FileLabelAttached { file_id, label })
                    }
                    Err(e) => Some(failure("attach file label", e)),
                }
            }
            StoreRequest::DetachFileLabel { file_id, label_id } => {
                match self.library.detach_file_label(file_id, label_id) {
                    Ok(()) => {
                        self.persist();
                        Some(StoreResponse::FileLabelDetached { file_id, label_id })
                    }
                    Err(e) => Some(failure("detach file label", e)),
                }
            }
            StoreRequest::Export {
                file_id,
                path,
                format,
            } => {
                let Some(file) = self.library.get_file(file_id) else {
                    return Some(StoreResponse::Failure {
                        op: "export",
                        message: format!("media file {} not found", file_id),
                    });
                };
                let data = ExportData {
                    media_file: file.path.clone(),
                    description: file.description.clone(),
                    labels: self.library.file_labels(file_id),
                    keyframes: self.library.keyframes_for_file(file_id),
                };
                let result = match format {
                    ExportFormat::Yaml => serialization::export_yaml(&data, &path),
                    ExportFormat::Json => serialization::export_json(&data, &path),
                };
                match result {
                    Ok(()) => Some(StoreResponse::Exported { path }),
                    Err(e) => Some(failure("export", e)),
                }
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = serialization::save_library(&self.library, &self.media_root) {
            log::error!("Failed to persist library: {}", e);
        }
    }
}

fn failure(op: &'static str, e: anyhow::Error) -> StoreResponse {
    StoreResponse::Failure {
        op,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::library::MediaType;
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::Duration;

    fn spawn_store(tag: &str) -> (StoreHandle, MediaFileId, PathBuf) {
        let root = std::env::temp_dir().join(format!("keymark-store-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let mut library = Library::new(root.to_string_lossy().to_string());
        let file_id = library.register_file("a.mp3".to_string(), MediaType::Audio, Some(60_000));
        (StoreHandle::spawn(library, root.clone()), file_id, root)
    }

    fn recv(store: &StoreHandle) -> StoreResponse {
        store
            .rx
            .recv_timeout(Duration::from_secs(5))
            .expect("store response")
    }

    #[test]
    fn test_open_file_ensures_pinned_keyframe() {
        let (store, file_id, root) = spawn_store("open");
        store.send(StoreRequest::OpenFile { file_id });

        match recv(&store) {
            StoreResponse::FileOpened { keyframes, .. } => {
                assert_eq!(keyframes.len(), 1);
                assert!(keyframes[0].pinned);
            }
            other => panic!("unexpected response: {:?}", other),
        }
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_create_then_delete_keyframe() {
        let (store, file_id, root) = spawn_store("create");
        store.send(StoreRequest::CreateKeyframe {
            file_id,
            timestamp_ms: 1500,
        });

        let created = match recv(&store) {
            StoreResponse::KeyframeCreated(kf) => kf,
            other => panic!("unexpected response: {:?}", other),
        };
        assert_eq!(created.timestamp_ms, 1500);

        store.send(StoreRequest::DeleteKeyframe { id: created.id });
        match recv(&store) {
            StoreResponse::KeyframeDeleted { id } => assert_eq!(id, created.id),
            other => panic!("unexpected response: {:?}", other),
        }
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_delete_pinned_reports_failure() {
        let (store, file_id, root) = spawn_store("pinned");
        store.send(StoreRequest::OpenFile { file_id });
        let pinned_id = match recv(&store) {
            StoreResponse::FileOpened { keyframes, .. } => keyframes[0].id,
            other => panic!("unexpected response: {:?}", other),
        };

        store.send(StoreRequest::DeleteKeyframe { id: pinned_id });
        match recv(&store) {
            StoreResponse::Failure { op, .. } => assert_eq!(op, "delete keyframe"),
            other => panic!("unexpected response: {:?}", other),
        }
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_search_echoes_generation() {
        let (store, file_id, root) = spawn_store("search");
        store.send(StoreRequest::CreateKeyframe {
            file_id,
            timestamp_ms: 0,
        });
        let kf = match recv(&store) {
            StoreResponse::KeyframeCreated(kf) => kf,
            other => panic!("unexpected response: {:?}", other),
        };
        store.send(StoreRequest::AttachLabel {
            keyframe_id: kf.id,
            name: "category".to_string(),
        });
        recv(&store);

        store.send(StoreRequest::SearchLabels {
            query: "cat".to_string(),
            generation: 42,
            scope: AnnotationScope::File,
        });
        match recv(&store) {
            StoreResponse::SearchResults {
                generation,
                scope,
                labels,
            } => {
                assert_eq!(generation, 42);
                assert_eq!(scope, AnnotationScope::File);
                assert_eq!(labels.len(), 1);
                assert_eq!(labels[0].name, "category");
            }
            other => panic!("unexpected response: {:?}", other),
        }
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_save_description_sends_no_response() {
        let (store, file_id, root) = spawn_store("save");
        store.send(StoreRequest::CreateKeyframe {
            file_id,
            timestamp_ms: 0,
        });
        let kf = match recv(&store) {
            StoreResponse::KeyframeCreated(kf) => kf,
            other => panic!("unexpected response: {:?}", other),
        };

        store.send(StoreRequest::SaveDescription {
            id: kf.id,
            text: "a note".to_string(),
        });
        // Follow with a search to prove the save produced no response of
        // its own.
        store.send(StoreRequest::SearchLabels {
            query: "x".to_string(),
            generation: 1,
            scope: AnnotationScope::Keyframe,
        });
        match recv(&store) {
            StoreResponse::SearchResults { .. } => {}
            other => panic!("unexpected response: {:?}", other),
        }
        assert!(matches!(
            store.rx.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Timeout)
        ));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_file_level_annotation_round_trip() {
        let (store, file_id, root) = spawn_store("filelabel");

        store.send(StoreRequest::SaveFileDescription {
            id: file_id,
            text: "band rehearsal".to_string(),
        });
        store.send(StoreRequest::AttachFileLabel {
            file_id,
            name: "music".to_string(),
        });
        let label = match recv(&store) {
            StoreResponse::FileLabelAttached { file_id: id, label } => {
                assert_eq!(id, file_id);
                label
            }
            other => panic!("unexpected response: {:?}", other),
        };

        // Reopening the file returns the saved description and label.
        store.send(StoreRequest::OpenFile { file_id });
        match recv(&store) {
            StoreResponse::FileOpened {
                description,
                labels,
                ..
            } => {
                assert_eq!(description, "band rehearsal");
                assert_eq!(labels, vec![label.clone()]);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        store.send(StoreRequest::DetachFileLabel {
            file_id,
            label_id: label.id,
        });
        match recv(&store) {
            StoreResponse::FileLabelDetached { label_id, .. } => assert_eq!(label_id, label.id),
            other => panic!("unexpected response: {:?}", other),
        }
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_in_flight_counts_acknowledged_requests_only() {
        let (store, file_id, root) = spawn_store("inflight");
        assert!(!store.has_in_flight());

        // Saves are fire-and-forget and never counted.
        store.send(StoreRequest::SaveFileDescription {
            id: file_id,
            text: "x".to_string(),
        });
        assert!(!store.has_in_flight());

        store.send(StoreRequest::CreateKeyframe {
            file_id,
            timestamp_ms: 100,
        });
        assert!(store.has_in_flight());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while store.has_in_flight() && std::time::Instant::now() < deadline {
            if store.try_recv().is_none() {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        assert!(!store.has_in_flight());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
