// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Options
//!
//! The three options the core relies on: verbose logging (also propagated
//! into every loaded stage module), cache preservation at shutdown, and an
//! explicit configuration file path.

use clap::Parser;
use std::path::PathBuf;

/// Cached image-processing pipeline with dynamically loaded stage modules.
#[derive(Parser, Debug, Clone)]
#[command(name = "image_pipeline", version, about)]
pub struct CliOptions {
    /// Enable verbose logging (core and stage modules)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Leave cache directories in place at shutdown
    #[arg(short = 'p', long = "preserve-cache")]
    pub preserve_cache: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Parses the process command line.
pub fn parse() -> CliOptions {
    CliOptions::parse()
}
