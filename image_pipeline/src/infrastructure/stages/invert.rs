// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Colour inversion stage: every RGB channel becomes `255 - value`, alpha
//! passes through. Takes no arguments.

use super::{pack, unpack};
use image_pipeline_domain::{
    BuildInfo, PipelineError, StageDescriptor, StageInput, StageModule, StageStatus,
};
use tracing::debug;

pub struct InvertModule {
    descriptor: StageDescriptor,
    verbose: bool,
}

impl InvertModule {
    pub fn new() -> Self {
        InvertModule {
            descriptor: StageDescriptor {
                name: "invert".to_string(),
                description: "Inverts the RGB channels of every pixel".to_string(),
                author: "Image Pipeline contributors".to_string(),
                year: "2025".to_string(),
                valid_args: Vec::new(),
                built_against: BuildInfo::current(),
            },
            verbose: false,
        }
    }
}

impl Default for InvertModule {
    fn default() -> Self {
        Self::new()
    }
}

impl StageModule for InvertModule {
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn setup(&mut self) -> Result<(), PipelineError> {
        if self.verbose {
            debug!(target: "stage::invert", "setup");
        }
        Ok(())
    }

    fn process(&mut self, input: &mut StageInput<'_>) -> StageStatus {
        let width = input.src.width();
        let height = input.src.height();
        input.dst.resize(width, height);

        for y in 0..height as usize {
            let row = y * width as usize;
            for x in 0..width as usize {
                let [r, g, b, a] = unpack(input.src.pixels()[row + x]);
                input.dst.pixels_mut()[row + x] = pack([255 - r, 255 - g, 255 - b, a]);
            }
            (input.progress)(((y + 1) * 100 / height.max(1) as usize) as u8);
        }
        StageStatus::Done
    }

    fn cleanup(&mut self) {
        if self.verbose {
            debug!(target: "stage::invert", "cleanup");
        }
    }
}
