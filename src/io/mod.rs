// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: media scanning, metadata probing, playback clock and
//! library persistence.

pub mod media;
pub mod playback;
pub mod scanner;
pub mod serialization;
