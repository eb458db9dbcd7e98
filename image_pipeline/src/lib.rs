// /////////////////////////////////////////////////////////////////////////////
// Image Pipeline
// Copyright (c) 2025 Image Pipeline contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Image Pipeline
//!
//! A cached image-processing pipeline. An ordered sequence of dynamically
//! resolved stage modules transforms submitted jobs' images, and every
//! stage's output is persisted in a per-stage bounded file cache so that a
//! re-run only executes the stages whose identity actually changed since
//! the job last succeeded.
//!
//! ## Layers
//!
//! - [`application`] - the `Core` context, stage registry, job store, and
//!   pipeline engine
//! - [`infrastructure`] - the file cache, builtin stage modules, the
//!   `image`-backed codec, configuration parsing, and logging setup
//! - [`presentation`] - the interactive shell
//!
//! Pure domain types live in the `image-pipeline-domain` crate.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::{Core, CoreOptions};
