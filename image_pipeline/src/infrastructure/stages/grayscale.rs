// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Grayscale conversion stage. One argument, `mode`: `average` (default)
//! weighs the channels equally, `luminosity` uses Rec. 709 weights. Any
//! other mode is a stage failure.

use super::{pack, unpack};
use image_pipeline_domain::{
    BuildInfo, PipelineError, StageDescriptor, StageInput, StageModule, StageStatus,
};
use tracing::{debug, warn};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Average,
    Luminosity,
}

pub struct GrayscaleModule {
    descriptor: StageDescriptor,
    verbose: bool,
}

impl GrayscaleModule {
    pub fn new() -> Self {
        GrayscaleModule {
            descriptor: StageDescriptor {
                name: "grayscale".to_string(),
                description: "Collapses the RGB channels to a single gray level".to_string(),
                author: "Image Pipeline contributors".to_string(),
                year: "2025".to_string(),
                valid_args: vec!["mode".to_string()],
                built_against: BuildInfo::current(),
            },
            verbose: false,
        }
    }
}

impl Default for GrayscaleModule {
    fn default() -> Self {
        Self::new()
    }
}

fn gray(mode: Mode, r: u8, g: u8, b: u8) -> u8 {
    match mode {
        Mode::Average => ((r as u32 + g as u32 + b as u32) / 3) as u8,
        // Rec. 709 luma weights, scaled to integers.
        Mode::Luminosity => ((r as u32 * 2126 + g as u32 * 7152 + b as u32 * 722) / 10000) as u8,
    }
}

impl StageModule for GrayscaleModule {
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn setup(&mut self) -> Result<(), PipelineError> {
        if self.verbose {
            debug!(target: "stage::grayscale", "setup");
        }
        Ok(())
    }

    fn process(&mut self, input: &mut StageInput<'_>) -> StageStatus {
        let mode = match input.arg("mode") {
            None | Some("average") => Mode::Average,
            Some("luminosity") => Mode::Luminosity,
            Some(other) => {
                warn!(target: "stage::grayscale", mode = other, "unknown mode");
                return StageStatus::Error;
            }
        };

        let width = input.src.width();
        let height = input.src.height();
        input.dst.resize(width, height);

        for y in 0..height as usize {
            let row = y * width as usize;
            for x in 0..width as usize {
                let [r, g, b, a] = unpack(input.src.pixels()[row + x]);
                let v = gray(mode, r, g, b);
                input.dst.pixels_mut()[row + x] = pack([v, v, v, a]);
            }
            (input.progress)(((y + 1) * 100 / height.max(1) as usize) as u8);
        }
        StageStatus::Done
    }

    fn cleanup(&mut self) {
        if self.verbose {
            debug!(target: "stage::grayscale", "cleanup");
        }
    }
}
