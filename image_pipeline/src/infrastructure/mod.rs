// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Technology-facing implementations behind the domain's ports:
//!
//! - [`repositories`] - the per-stage file cache on the local filesystem
//! - [`stages`] - builtin stage modules and the static module loader
//! - [`services`] - the `image`-crate-backed codec
//! - [`config`] - configuration file parsing
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod logging;
pub mod repositories;
pub mod services;
pub mod stages;
