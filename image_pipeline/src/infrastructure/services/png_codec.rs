// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # PNG-Backed Image Codec
//!
//! [`ImageCodec`] implementation on top of the `image` crate. Any format
//! the crate can read decodes to the core's 32-bpp buffer; everything is
//! written back out as PNG. PNG because cache intermediates must survive a
//! save/load round trip bit-exactly - a lossy format would make a resumed
//! pipeline produce different bytes than a full run.
//!
//! Pixels cross the boundary as little-endian `[r, g, b, a]` quads packed
//! into the domain's `u32` samples. The core never looks inside them; only
//! this codec and the stage modules interpret channels.

use image_pipeline_domain::{Image, ImageCodec, PipelineError};
use std::path::Path;
use tracing::debug;

/// Codec reading any `image`-supported format and writing PNG.
#[derive(Debug, Default)]
pub struct PngCodec;

impl PngCodec {
    pub fn new() -> Self {
        PngCodec
    }

    fn map_error(err: image::ImageError) -> PipelineError {
        match err {
            image::ImageError::IoError(io) => PipelineError::io_error(io.to_string()),
            other => PipelineError::codec_error(other.to_string()),
        }
    }
}

impl ImageCodec for PngCodec {
    fn load(&self, path: &Path) -> Result<Image, PipelineError> {
        debug!(target: "codec", path = %path.display(), "loading image");
        let decoded = image::open(path).map_err(Self::map_error)?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels = rgba
            .as_raw()
            .chunks_exact(4)
            .map(|q| u32::from_le_bytes([q[0], q[1], q[2], q[3]]))
            .collect();
        Image::from_pixels(width, height, pixels)
    }

    fn save(&self, img: &Image, path: &Path) -> Result<(), PipelineError> {
        debug!(target: "codec", path = %path.display(), width = img.width(), height = img.height(), "saving image");
        if img.is_unallocated() {
            return Err(PipelineError::codec_error(
                "cannot encode an unallocated image",
            ));
        }
        let bytes: Vec<u8> = img.pixels().iter().flat_map(|p| p.to_le_bytes()).collect();
        let buffer = image::RgbaImage::from_raw(img.width(), img.height(), bytes).ok_or_else(|| {
            PipelineError::internal_error("pixel buffer length disagrees with image dimensions")
        })?;
        buffer
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(Self::map_error)
    }
}
