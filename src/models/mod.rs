// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for the Keymark application.

pub mod keyframe;
pub mod label;
pub mod library;
