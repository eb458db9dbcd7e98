// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Build Compatibility Descriptor
//!
//! Every stage module declares the core build it was compiled against; the
//! registry refuses to load a module whose ABI revision or debug flavour
//! differs from the running core. Version and date are informational only
//! and never part of the compatibility decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ABI revision of the stage module contract exposed by this core.
///
/// Bumped whenever `StageDescriptor`, `StageInput`, or the status codes
/// change incompatibly.
pub const ABI_VERSION: u32 = 1;

/// Build metadata compared between the core and each loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub date: String,
    pub debug: bool,
    pub abi: u32,
}

/// The critical difference found between two builds, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMismatch {
    Abi { module: u32, core: u32 },
    Debug { module: bool, core: bool },
}

impl BuildInfo {
    pub fn new(version: impl Into<String>, date: impl Into<String>, debug: bool, abi: u32) -> Self {
        BuildInfo {
            version: version.into(),
            date: date.into(),
            debug,
            abi,
        }
    }

    /// Describes the build of the running core.
    pub fn current() -> Self {
        BuildInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            date: option_env!("BUILD_DATE").unwrap_or("unknown").to_string(),
            debug: cfg!(debug_assertions),
            abi: ABI_VERSION,
        }
    }

    /// Compares the fields that gate module loading.
    ///
    /// ABI revision is checked before debug flavour; only the first
    /// difference found is reported.
    pub fn compare_critical(&self, core: &BuildInfo) -> Result<(), BuildMismatch> {
        if self.abi != core.abi {
            return Err(BuildMismatch::Abi {
                module: self.abi,
                core: core.abi,
            });
        }
        if self.debug != core.debug {
            return Err(BuildMismatch::Debug {
                module: self.debug,
                core: core.debug,
            });
        }
        Ok(())
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} ({}, abi {}, {})",
            self.version,
            self.date,
            self.abi,
            if self.debug { "debug" } else { "release" }
        )
    }
}

impl fmt::Display for BuildMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMismatch::Abi { module, core } => {
                write!(f, "ABI version mismatch: module abi {} vs. core abi {}", module, core)
            }
            BuildMismatch::Debug { module, core } => write!(
                f,
                "debug build mismatch: module is {}, core is {}",
                if *module { "debug" } else { "non-debug" },
                if *core { "debug" } else { "non-debug" }
            ),
        }
    }
}
