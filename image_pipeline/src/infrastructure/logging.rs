// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Setup
//!
//! Installs the global `tracing` subscriber. Subsystems log under their own
//! targets (`cache`, `registry`, `jobs`, `pipeline`, `shell`, `config`,
//! `codec`, `stage::*`), so `RUST_LOG` can focus on one of them; without
//! `RUST_LOG` the verbose CLI flag picks between `info` and `debug`.

use tracing_subscriber::EnvFilter;

/// Initialises the tracing subscriber once; later calls are no-ops.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
