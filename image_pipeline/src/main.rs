// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Binary entry point: parse the CLI, initialise logging, load
//! configuration, assemble the core, and hand stdin to the shell thread
//! until it exits.

use image_pipeline::infrastructure::config::ConfigLoader;
use image_pipeline::infrastructure::logging;
use image_pipeline::infrastructure::services::PngCodec;
use image_pipeline::infrastructure::stages::BuiltinLoader;
use image_pipeline::presentation::Shell;
use image_pipeline::{Core, CoreOptions};
use image_pipeline_bootstrap::exit_code::{exit_code_for, ExitCode};
use image_pipeline_domain::{BuildInfo, PipelineError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;

fn main() -> std::process::ExitCode {
    let cli = image_pipeline_bootstrap::bootstrap_cli();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::Ok.into(),
        Err(e) => {
            error!(category = e.category(), "{}", e);
            exit_code_for(&e).into()
        }
    }
}

fn run(cli: &image_pipeline_bootstrap::CliOptions) -> Result<(), PipelineError> {
    println!("Image pipeline {}", BuildInfo::current());
    println!("Type 'help' for the command list.\n");

    let config = ConfigLoader::load(cli.config.as_deref())?;
    let core = Core::setup(
        &config,
        Box::new(BuiltinLoader::new()),
        Arc::new(PngCodec::new()),
        CoreOptions {
            verbose: cli.verbose,
            preserve_cache: cli.preserve_cache,
        },
    )?;

    let core = Arc::new(Mutex::new(core));
    let shell = Shell::new(Arc::clone(&core)).spawn()?;
    if shell.join().is_err() {
        error!(target: "shell", "shell thread panicked");
    }

    match Arc::try_unwrap(core) {
        Ok(mutex) => mutex.into_inner().cleanup(),
        Err(_) => {
            return Err(PipelineError::internal_error(
                "core still shared at shutdown",
            ))
        }
    }
    Ok(())
}
