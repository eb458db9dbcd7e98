// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Brightness adjustment stage. One argument, `amount`: a signed integer
//! delta applied to every RGB channel with saturation. An unset `amount`
//! means zero; an unparsable one is a stage failure.

use super::{pack, unpack};
use image_pipeline_domain::{
    BuildInfo, PipelineError, StageDescriptor, StageInput, StageModule, StageStatus,
};
use tracing::{debug, warn};

pub struct BrightnessModule {
    descriptor: StageDescriptor,
    verbose: bool,
}

impl BrightnessModule {
    pub fn new() -> Self {
        BrightnessModule {
            descriptor: StageDescriptor {
                name: "brightness".to_string(),
                description: "Adds a signed delta to the RGB channels of every pixel".to_string(),
                author: "Image Pipeline contributors".to_string(),
                year: "2025".to_string(),
                valid_args: vec!["amount".to_string()],
                built_against: BuildInfo::current(),
            },
            verbose: false,
        }
    }
}

impl Default for BrightnessModule {
    fn default() -> Self {
        Self::new()
    }
}

fn adjust(channel: u8, amount: i32) -> u8 {
    (channel as i32 + amount).clamp(0, 255) as u8
}

impl StageModule for BrightnessModule {
    fn descriptor(&self) -> &StageDescriptor {
        &self.descriptor
    }

    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    fn setup(&mut self) -> Result<(), PipelineError> {
        if self.verbose {
            debug!(target: "stage::brightness", "setup");
        }
        Ok(())
    }

    fn process(&mut self, input: &mut StageInput<'_>) -> StageStatus {
        let amount = match input.arg("amount") {
            None => 0,
            Some(raw) => match raw.parse::<i32>() {
                Ok(v) => v,
                Err(_) => {
                    warn!(target: "stage::brightness", amount = raw, "amount is not an integer");
                    return StageStatus::Error;
                }
            },
        };

        let width = input.src.width();
        let height = input.src.height();
        input.dst.resize(width, height);

        for y in 0..height as usize {
            let row = y * width as usize;
            for x in 0..width as usize {
                let [r, g, b, a] = unpack(input.src.pixels()[row + x]);
                input.dst.pixels_mut()[row + x] =
                    pack([adjust(r, amount), adjust(g, amount), adjust(b, amount), a]);
            }
            (input.progress)(((y + 1) * 100 / height.max(1) as usize) as u8);
        }
        StageStatus::Done
    }

    fn cleanup(&mut self) {
        if self.verbose {
            debug!(target: "stage::brightness", "cleanup");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_pipeline_domain::Image;

    fn run(module: &mut BrightnessModule, src: &Image, args: &[(String, String)]) -> (StageStatus, Image) {
        let mut dst = Image::empty();
        let mut progress = |_p: u8| {};
        let status = module.process(&mut StageInput {
            src,
            dst: &mut dst,
            args,
            progress: &mut progress,
        });
        (status, dst)
    }

    #[test]
    fn test_positive_amount_saturates_at_255() {
        let src = Image::from_pixels(1, 1, vec![pack([250, 10, 0, 9])]).unwrap();
        let args = vec![("amount".to_string(), "20".to_string())];
        let (status, dst) = run(&mut BrightnessModule::new(), &src, &args);

        assert_eq!(status, StageStatus::Done);
        assert_eq!(dst.pixels(), &[pack([255, 30, 20, 9])]);
    }

    #[test]
    fn test_negative_amount_saturates_at_zero() {
        let src = Image::from_pixels(1, 1, vec![pack([5, 100, 200, 1])]).unwrap();
        let args = vec![("amount".to_string(), "-50".to_string())];
        let (_, dst) = run(&mut BrightnessModule::new(), &src, &args);

        assert_eq!(dst.pixels(), &[pack([0, 50, 150, 1])]);
    }

    #[test]
    fn test_unset_amount_is_identity() {
        let src = Image::from_pixels(1, 1, vec![pack([7, 8, 9, 10])]).unwrap();
        let (status, dst) = run(&mut BrightnessModule::new(), &src, &[]);

        assert_eq!(status, StageStatus::Done);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_unparsable_amount_is_stage_failure() {
        let src = Image::new(1, 1);
        let args = vec![("amount".to_string(), "bright".to_string())];
        let (status, _) = run(&mut BrightnessModule::new(), &src, &args);

        assert_eq!(status, StageStatus::Error);
    }
}
