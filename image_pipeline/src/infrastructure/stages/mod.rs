// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Builtin Stage Modules
//!
//! Statically linked implementations of the stage module ABI, resolved by
//! name through [`BuiltinLoader`]. In a deployment with real out-of-tree
//! modules the loader collaborator resolves shared objects instead; these
//! builtins keep the pipeline usable (and testable) without any.
//!
//! Pixel samples are `[r, g, b, a]` quads packed little-endian into `u32`,
//! matching the codec's layout. All builtins preserve the alpha channel.

pub mod brightness;
pub mod grayscale;
pub mod invert;

pub use brightness::BrightnessModule;
pub use grayscale::GrayscaleModule;
pub use invert::InvertModule;

use image_pipeline_domain::{ModuleLoader, PipelineError, StageModule};
use std::path::Path;
use tracing::debug;

pub(crate) fn unpack(px: u32) -> [u8; 4] {
    px.to_le_bytes()
}

pub(crate) fn pack(channels: [u8; 4]) -> u32 {
    u32::from_le_bytes(channels)
}

/// Loader resolving the statically linked builtin modules by name.
///
/// The `directory` argument of the loader contract identifies where a
/// dynamic loader would look for shared objects; builtins exist everywhere,
/// so it is accepted and logged but otherwise unused.
#[derive(Debug, Default)]
pub struct BuiltinLoader;

impl BuiltinLoader {
    pub fn new() -> Self {
        BuiltinLoader
    }

    /// Names this loader can resolve.
    pub fn available() -> &'static [&'static str] {
        &["invert", "brightness", "grayscale"]
    }
}

impl ModuleLoader for BuiltinLoader {
    fn load(&self, directory: &Path, module_name: &str) -> Result<Box<dyn StageModule>, PipelineError> {
        debug!(target: "registry", directory = %directory.display(), module_name, "resolving builtin module");
        match module_name {
            "invert" => Ok(Box::new(InvertModule::new())),
            "brightness" => Ok(Box::new(BrightnessModule::new())),
            "grayscale" => Ok(Box::new(GrayscaleModule::new())),
            other => Err(PipelineError::not_found(format!(
                "no builtin stage module named {} (available: {})",
                other,
                Self::available().join(", ")
            ))),
        }
    }
}
