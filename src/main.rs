// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keymark - keyframe marking and labeling for media files.
//!
//! A cross-platform desktop application for placing keyframes on a media
//! timeline and annotating them with descriptions and labels.

mod app;
mod engine;
mod io;
mod models;
mod store;
mod ui;
mod util;

use anyhow::Result;
use app::KeymarkApp;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 500.0])
            .with_title("Keymark"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Keymark",
        options,
        Box::new(|_cc| Ok(Box::new(KeymarkApp::new()))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
