// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media metadata probing.
//!
//! Reads container metadata to determine a media file's duration. Only the
//! format header is parsed; no frames are decoded. Files whose container
//! symphonia cannot read simply report an unknown duration, which the
//! timeline treats as "metadata not ready yet".

use anyhow::Result;
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Probe a media file's duration in milliseconds, when the container
/// declares one.
pub fn probe_duration_ms(path: &Path) -> Result<Option<u64>> {
    let file = std::fs::File::open(path)?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let format = probed.format;
    let Some(track) = format.default_track() else {
        return Ok(None);
    };

    let params = &track.codec_params;
    let (Some(time_base), Some(n_frames)) = (params.time_base, params.n_frames) else {
        return Ok(None);
    };

    let time = time_base.calc_time(n_frames);
    let ms = time.seconds as f64 * 1000.0 + time.frac * 1000.0;
    Ok(Some(ms.round() as u64))
}
