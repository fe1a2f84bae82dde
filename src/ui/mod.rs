// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the Keymark application.

pub mod detail;
pub mod timeline;
pub mod transport;
