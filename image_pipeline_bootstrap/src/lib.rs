// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Layer
//!
//! Sits outside the domain, application, and infrastructure layers and
//! owns the process boundary: command-line parsing and the mapping from
//! domain errors to Unix exit codes. The enterprise layers never reach
//! back into this crate; only `main` wires it in.

pub mod cli;
pub mod exit_code;

pub use cli::CliOptions;
pub use exit_code::{exit_code_for, ExitCode};

/// Parses the process's command line.
///
/// Clap handles `--help` and `--version` itself, exiting the process.
pub fn bootstrap_cli() -> CliOptions {
    cli::parse()
}
