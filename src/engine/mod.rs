// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interaction engines: the headless state machines behind the UI.
//!
//! These modules hold all timeline, autosave and autocomplete state and are
//! exercised by the egui layer purely through their named operations.

pub mod autocomplete;
pub mod panel;
pub mod persister;
pub mod timeline;
